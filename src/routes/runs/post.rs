use super::*;

#[post("/runs")]
pub async fn post_run_handler(
    queue: web::Data<RunQueue>,
    run_log: web::Data<RunLog>,
    problems: web::Data<Vec<ProblemRecord>>,
    body: web::Json<RunSubmission>,
) -> impl Responder {
    let submission = body.into_inner();

    if submission.target_case.is_some() && submission.target_group.is_none() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
        });
    }

    let problem = match submission.problem_id {
        Some(id) => match problems.iter().find(|p| p.id == id) {
            Some(p) => Some(p),
            None => {
                return HttpResponse::NotFound().json(ErrorResponse {
                    reason: "ERR_NOT_FOUND",
                    code: 3,
                });
            }
        },
        None => None,
    };

    let Some(test_source) = submission
        .test_source
        .clone()
        .or_else(|| problem.map(|p| p.test_source.clone()))
    else {
        return HttpResponse::BadRequest().json(ErrorResponseWithMessage {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
            message: "Either test_source or problem_id is required.".to_string(),
        });
    };

    let user_source = if submission.use_reference {
        match problem.and_then(|p| p.reference_solution.clone()) {
            Some(solution) => Some(solution),
            None => {
                return HttpResponse::NotFound().json(ErrorResponseWithMessage {
                    reason: "ERR_NOT_FOUND",
                    code: 3,
                    message: "No reference solution for this problem.".to_string(),
                });
            }
        }
    } else {
        submission
            .user_source
            .clone()
            .or_else(|| problem.map(|p| p.starter_source.clone()))
    };
    let Some(user_source) = user_source else {
        return HttpResponse::BadRequest().json(ErrorResponseWithMessage {
            reason: "ERR_INVALID_ARGUMENT",
            code: 1,
            message: "Either user_source or problem_id is required.".to_string(),
        });
    };

    let request = RunRequest {
        user_source,
        test_source,
        target_group: submission.target_group,
        target_case: submission.target_case,
    };

    let run_id = run_log.create(
        submission.problem_id,
        request.target_group.as_deref(),
        request.target_case.as_deref(),
    );

    let (responder, response) = oneshot::channel::<RunResult>();
    let queued = queue.push(RunMessage {
        run_id,
        request,
        responder,
    });
    if !queued {
        log::error!("Run {run_id} rejected: queue is closed");
        return HttpResponse::ServiceUnavailable().json(ErrorResponse {
            reason: "ERR_INTERNAL",
            code: 6,
        });
    }
    log::debug!("Sent run {run_id} to queue");

    // The runtime never interleaves runs; this suspends until ours is done.
    match response.await {
        Ok(_) => match run_log.get(run_id) {
            Some(record) => {
                log::info!("Received final result of run {run_id}");
                HttpResponse::Ok().json(record)
            }
            None => HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_INTERNAL",
                code: 6,
            }),
        },
        Err(e) => {
            log::error!("Failed to receive run {run_id} response: {e}");
            HttpResponse::InternalServerError().json(ErrorResponse {
                reason: "ERR_INTERNAL",
                code: 6,
            })
        }
    }
}
