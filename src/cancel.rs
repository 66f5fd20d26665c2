//! Cooperative cancellation for long crawls.
//!
//! The token is checked at every suspension point in discovery and in the
//! per-page loop. Cancelling lets in-flight pages drain; queued pages are
//! recorded as failed with the cancellation reason instead of being silently
//! dropped. The job timeout is implemented as cancellation-with-cause.

use std::sync::Arc;
use tokio::sync::watch;

/// Clonable cancellation handle shared across a conversion job.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<Option<String>>>,
    rx: watch::Receiver<Option<String>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self { tx: Arc::new(tx), rx }
    }

    /// Signal cancellation with a human-readable reason.
    ///
    /// Idempotent: the first reason wins, later calls are ignored.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.tx.send_if_modified(|state| {
            if state.is_none() {
                *state = Some(reason.into());
                true
            } else {
                false
            }
        });
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// The reason passed to [`cancel`](Self::cancel), if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.rx.borrow().clone()
    }

    /// Resolves when the token is cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if rx.borrow().is_some() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender dropped without cancelling; park forever so callers
                // select!-ing against real work are not woken spuriously.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
