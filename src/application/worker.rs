//! Background worker for non-blocking backend calls.
//!
//! Each call runs on its own short-lived thread and reports back over a
//! channel, so the TUI main loop never blocks on the network. Dropping a
//! [`BackgroundTask`] drops its receiver; the worker's final send then fails
//! and the late response is discarded.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// State of a background task as seen by the owner.
#[derive(Debug)]
pub enum TaskPoll<T> {
    /// Still running
    Pending,
    /// Finished with a value
    Done(T),
    /// The worker thread exited without reporting (it panicked)
    Lost,
}

/// Handle to a running background task.
pub struct BackgroundTask<T> {
    rx: Receiver<T>,
    _handle: JoinHandle<()>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Spawn `job` on a worker thread.
    pub fn spawn<F>(name: &str, job: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let label = name.to_string();

        let handle = thread::spawn(move || {
            let value = job();
            if tx.send(value).is_err() {
                tracing::debug!("Discarding late {} response: owner is gone", label);
            }
        });

        Self {
            rx,
            _handle: handle,
        }
    }

    /// Try to receive the result (non-blocking).
    pub fn try_recv(&self) -> TaskPoll<T> {
        match self.rx.try_recv() {
            Ok(value) => TaskPoll::Done(value),
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => TaskPoll::Lost,
        }
    }

    /// Block until the task finishes. `None` if the worker died.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_value() {
        let task = BackgroundTask::spawn("sum", || 2 + 2);
        assert_eq!(task.wait(), Some(4));
    }

    #[test]
    fn test_try_recv_pending_then_done() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let task = BackgroundTask::spawn("gated", move || {
            let _ = gate_rx.recv();
            "done"
        });

        assert!(matches!(task.try_recv(), TaskPoll::Pending));
        gate_tx.send(()).expect("gate");

        let mut polled = None;
        for _ in 0..200 {
            if let TaskPoll::Done(value) = task.try_recv() {
                polled = Some(value);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(polled, Some("done"));
    }

    #[test]
    fn test_dropped_task_discards_response() {
        let (done_tx, done_rx) = mpsc::channel();
        let task = BackgroundTask::spawn("orphan", move || {
            thread::sleep(Duration::from_millis(20));
            let _ = done_tx.send(());
            1
        });
        drop(task);
        // The worker still completes without panicking on the closed channel.
        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
    }
}
