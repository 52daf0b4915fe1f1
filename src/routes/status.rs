use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;

use crate::worker::ReadyFlag;

#[derive(Serialize)]
struct StatusResponse {
    ready: bool,
}

/// Readiness signal for UI bootstrap: the run controls stay disabled until
/// the embedded runtime has finished booting.
#[get("/status")]
pub async fn get_status_handler(ready: web::Data<ReadyFlag>) -> impl Responder {
    HttpResponse::Ok().json(StatusResponse { ready: ready.get() })
}
