use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Cancellation scope for guest work.
///
/// Cancelling a scope makes every [`CancelScope::run`] inside it (and inside its child
/// scopes) give up at the next suspension point. Cancellation is cooperative: code between
/// two suspension points always runs to the end.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    token: CancellationToken,
    caught: Arc<AtomicBool>,
}

impl CancelScope {
    /// Creates a root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope that is cancelled whenever `self` is.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            caught: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested (directly or through a parent).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether a [`run`](CancelScope::run) of this scope was actually cut short.
    pub fn cancelled_caught(&self) -> bool {
        self.caught.load(Ordering::Acquire)
    }

    /// Underlying token, for integration with other `tokio-util` users.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves once the scope is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Runs `fut` inside the scope; `None` if the scope was cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                self.caught.store(true, Ordering::Release);
                None
            }
            out = fut => Some(out),
        }
    }
}
