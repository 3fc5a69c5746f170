//! Debounce utility
//!
//! A `Debouncer` forwards a value only after no newer value has been pushed
//! for the whole delay. It owns at most one pending timer task; pushing a new
//! value aborts it, and so does dropping the debouncer, so a torn-down
//! consumer never receives a late emission.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Timer-owning debouncer
///
/// Must be used inside a tokio runtime (each push spawns a timer task).
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    tx: mpsc::UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Create a debouncer and the receiver its settled values arrive on
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                tx,
                pending: None,
            },
            rx,
        )
    }

    /// Configured delay
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value; the delay restarts from now
    pub fn push(&mut self, value: T) {
        self.cancel();

        // Deadline fixed at push time, not when the task first gets polled
        let deadline = Instant::now() + self.delay;
        let tx = self.tx.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the consumer is gone; nothing to do
            let _ = tx.send(value);
        }));
    }

    /// Drop the pending emission, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a value is waiting for its delay to elapse
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
