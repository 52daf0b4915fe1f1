use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware, web};

use crate::config::{ProblemRecord, ServerConfig};
use crate::history::RunLog;
use crate::queue::RunQueue;
use crate::routes::{self, json_error_handler, query_error_handler};
use crate::worker::ReadyFlag;

/// Registers every route plus the shared payload error handlers. Kept
/// separate from `build_server` so tests can mount the same app in-process.
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(routes::post_run_handler)
        .service(routes::get_runs_handler)
        .service(routes::get_run_by_id_handler)
        .service(routes::get_problems_handler)
        .service(routes::get_problem_by_id_handler)
        .service(routes::get_status_handler)
        .service(routes::exit);
}

pub fn build_server(
    config: ServerConfig,
    problems: Arc<Vec<ProblemRecord>>,
    run_log: Arc<RunLog>,
    queue: Arc<RunQueue>,
    ready: Arc<ReadyFlag>,
) -> std::io::Result<Server> {
    let problems = web::Data::from(problems);
    let run_log = web::Data::from(run_log);
    let queue = web::Data::from(queue);
    let ready = web::Data::from(ready);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(problems.clone())
            .app_data(run_log.clone())
            .app_data(queue.clone())
            .app_data(ready.clone())
            .wrap(middleware::Logger::default())
            .configure(configure_services)
    })
    .bind((
        config.bind_address.unwrap_or("127.0.0.1".to_string()),
        config.bind_port.unwrap_or(8000),
    ))?
    .run();

    Ok(server)
}
