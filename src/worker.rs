use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::history::RunLog;
use crate::queue::RunQueue;
use crate::sandbox::Sandbox;

/// Synchronous readiness signal shared with the HTTP layer, so UI bootstrap
/// can gate its run controls without touching the runtime thread.
pub struct ReadyFlag(AtomicBool);

impl ReadyFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn set(&self, ready: bool) {
        self.0.store(ready, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for ReadyFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the dedicated runtime thread.
///
/// There is exactly one: the interpreter is not `Send`, every run mutates
/// the same shared namespace, and the queue serializes submissions in FIFO
/// order. If the runtime fails to boot the thread keeps serving the queue so
/// every run still resolves, each with the fixed not-ready result.
pub fn spawn_runtime_worker(
    queue: Arc<RunQueue>,
    run_log: Arc<RunLog>,
    ready: Arc<ReadyFlag>,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("runtime-worker".to_string())
        .spawn(move || {
            let mut sandbox = Sandbox::new();
            if sandbox.initialize() {
                ready.set(true);
                log::info!("Runtime worker initialized");
            } else {
                log::error!("Runtime failed to boot; runs will resolve as not ready");
            }

            while let Some(message) = queue.pop_blocking() {
                let run_id = message.run_id;
                log::info!("Worker got run {run_id} from queue");
                run_log.set_running(run_id);

                let result = sandbox.execute_tests(&message.request);
                match &result.syntax_or_fatal_error {
                    Some(fatal) => log::info!("Run {run_id} ended fatally: {fatal}"),
                    None => log::info!(
                        "Run {run_id} finished: {} cases, {} failures, {} errors",
                        result.cases_run,
                        result.failure_count,
                        result.error_count
                    ),
                }

                run_log.finish(run_id, result.clone());
                if message.responder.send(result).is_err() {
                    log::warn!("Failed to send run {run_id} result back to server");
                }
            }

            log::info!("Runtime worker has shut down gracefully");
        })
        .expect("Failed to spawn runtime worker thread")
}
