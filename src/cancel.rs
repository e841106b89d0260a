//! Cooperative cancellation for a render run.
//!
//! A [`CancelToken`] is cheap to clone; every clone observes the same flag.
//! The orchestrator races the pacing wait and the HTTP call against
//! [`CancelToken::cancelled`], so cancelling abandons the in-flight batch
//! without producing an artifact. The rate gate is not rewound.

use std::sync::Arc;
use tokio::sync::watch;

/// Shared cancellation flag backed by a `tokio::sync::watch` channel.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Signal cancellation to every clone. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    ///
    /// Resolves immediately if the token is already cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|flag| *flag).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
