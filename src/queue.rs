use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tokio::sync::oneshot;

use crate::sandbox::{RunRequest, RunResult};

pub struct RunMessage {
    pub run_id: u32,
    pub request: RunRequest,
    pub responder: oneshot::Sender<RunResult>,
}

/// FIFO hand-off between the async HTTP handlers and the single runtime
/// thread. The runtime never interleaves two runs, so overlapping
/// submissions simply wait their turn here.
pub struct RunQueue {
    inner: Mutex<Inner>,
    available: Condvar,
}

struct Inner {
    queue: VecDeque<RunMessage>,
    closed: bool,
}

impl RunQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Enqueues a run. Returns `false` once the queue has been closed for
    /// shutdown, in which case the message is dropped and its responder
    /// resolves as cancelled on the caller side.
    pub fn push(&self, message: RunMessage) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.queue.push_back(message);
        self.available.notify_one();
        true
    }

    /// Blocks the runtime thread until the next run arrives. Returns `None`
    /// once the queue is closed and drained.
    pub fn pop_blocking(&self) -> Option<RunMessage> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(message) = inner.queue.pop_front() {
                return Some(message);
            }
            if inner.closed {
                return None;
            }
            self.available.wait(&mut inner);
        }
    }

    pub fn close(&self) {
        self.inner.lock().closed = true;
        self.available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RunQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::RunRequest;

    fn message(run_id: u32) -> (RunMessage, oneshot::Receiver<RunResult>) {
        let (tx, rx) = oneshot::channel();
        (
            RunMessage {
                run_id,
                request: RunRequest::new("", ""),
                responder: tx,
            },
            rx,
        )
    }

    #[test]
    fn pops_in_submission_order() {
        let queue = RunQueue::new();
        let (first, _rx1) = message(1);
        let (second, _rx2) = message(2);
        assert!(queue.push(first));
        assert!(queue.push(second));

        assert_eq!(queue.pop_blocking().unwrap().run_id, 1);
        assert_eq!(queue.pop_blocking().unwrap().run_id, 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn close_rejects_new_pushes_and_drains() {
        let queue = RunQueue::new();
        let (pending, _rx) = message(1);
        assert!(queue.push(pending));
        queue.close();

        let (late, _rx_late) = message(2);
        assert!(!queue.push(late));

        // Already queued work is still handed out before the None.
        assert!(queue.pop_blocking().is_some());
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn close_wakes_a_blocked_consumer() {
        let queue = std::sync::Arc::new(RunQueue::new());
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop_blocking().is_none())
        };

        // Give the consumer a moment to block on the condvar.
        std::thread::sleep(std::time::Duration::from_millis(50));
        queue.close();
        assert!(consumer.join().unwrap());
    }
}
