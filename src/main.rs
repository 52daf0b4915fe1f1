use std::sync::Arc;

use clap::Parser;

use pydrill::config::{CliArgs, Config};
use pydrill::history::RunLog;
use pydrill::queue::RunQueue;
use pydrill::web_server::build_server;
use pydrill::worker::{ReadyFlag, spawn_runtime_worker};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let Config {
        server: server_config,
        problems,
    } = cli.to_config().expect("Failed to load configuration");

    let problems = Arc::new(problems);
    let run_log = Arc::new(RunLog::new());
    let queue = Arc::new(RunQueue::new());
    let ready = Arc::new(ReadyFlag::new());

    // ======= PREPARATION END, EXECUTION START =======

    let worker = spawn_runtime_worker(queue.clone(), run_log.clone(), ready.clone());

    let server = build_server(server_config, problems, run_log, queue.clone(), ready)
        .expect("Failed to build server");

    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    // ===== EXECUTION END, WAITING FOR SHUTDOWN ======

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    // 1. Shutdown actix-web server gracefully
    server_handle.stop(true).await;

    // 2. Close the queue so the runtime worker drains what is left and exits
    queue.close();
    log::info!("Shutdown signal sent to runtime worker, waiting for it to finish...");

    // 3. Wait until the worker terminates
    if worker.join().is_err() {
        log::error!("Runtime worker panicked");
    }

    log::info!("Shutdown complete");
    Ok(())
}
