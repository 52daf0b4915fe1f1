use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;

use super::ErrorResponseWithMessage;
use crate::config::ProblemRecord;

/// Client-facing projection of a catalog record. The unit-test suite and
/// the reference solution never leave the server: runs against them happen
/// here, not in the client.
#[derive(Serialize, Debug)]
pub struct ProblemSummary {
    pub id: u32,
    pub title: String,
    pub starter_source: String,
    pub misc: Option<serde_json::Value>,
}

impl From<&ProblemRecord> for ProblemSummary {
    fn from(record: &ProblemRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            starter_source: record.starter_source.clone(),
            misc: record.misc.clone(),
        }
    }
}

#[get("/problems")]
pub async fn get_problems_handler(problems: web::Data<Vec<ProblemRecord>>) -> impl Responder {
    let summaries: Vec<ProblemSummary> = problems.iter().map(ProblemSummary::from).collect();
    log::info!("Listed {} problems", summaries.len());
    HttpResponse::Ok().json(summaries)
}

#[get("/problems/{id}")]
pub async fn get_problem_by_id_handler(
    problems: web::Data<Vec<ProblemRecord>>,
    path: web::Path<(u32,)>,
) -> impl Responder {
    let problem_id = path.into_inner().0;

    match problems.iter().find(|p| p.id == problem_id) {
        Some(record) => HttpResponse::Ok().json(ProblemSummary::from(record)),
        None => HttpResponse::NotFound().json(ErrorResponseWithMessage {
            reason: "ERR_NOT_FOUND",
            code: 3,
            message: format!("Problem {problem_id} not found."),
        }),
    }
}
