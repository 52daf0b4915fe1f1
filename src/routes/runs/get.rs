use super::*;

#[get("/runs")]
pub async fn get_runs_handler(
    run_log: web::Data<RunLog>,
    query: web::Query<RunQueryFilter>,
) -> impl Responder {
    if let Some(from_str) = &query.from
        && DateTime::parse_from_rfc3339(from_str).is_err()
    {
        return HttpResponse::BadRequest().json(ErrorResponse {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
        });
    }
    if let Some(to_str) = &query.to
        && DateTime::parse_from_rfc3339(to_str).is_err()
    {
        return HttpResponse::BadRequest().json(ErrorResponse {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
        });
    }

    let records = run_log.query(&query);
    log::info!("Got {} run records", records.len());
    HttpResponse::Ok().json(records)
}

#[get("/runs/{id}")]
pub async fn get_run_by_id_handler(
    run_log: web::Data<RunLog>,
    path: web::Path<(u32,)>,
) -> impl Responder {
    let run_id = path.into_inner().0;

    match run_log.get(run_id) {
        Some(record) => {
            log::info!("Got the record of run {run_id}");
            HttpResponse::Ok().json(record)
        }
        None => {
            log::info!("Got nothing with run id {run_id}");
            HttpResponse::NotFound().json(ErrorResponseWithMessage {
                reason: "ERR_NOT_FOUND",
                code: 3,
                message: format!("Run {run_id} not found."),
            })
        }
    }
}
