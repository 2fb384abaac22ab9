//! # Nursery: structured spawning of guest tasks.
//!
//! A nursery owns a [`CancelScope`] and a [`TaskTracker`]. Children started with
//! [`Nursery::start_soon`] run inside the scope; [`open_nursery`] returns only after
//! every child has finished.
//!
//! ## Failure flow
//! ```text
//! child fails ──► first failure recorded ──► scope cancelled ──► siblings stop
//!                                                                    │
//! body finishes ──► tracker.close() ──► tracker.wait() ◄─────────────┘
//!                                            │
//!                                            ▼
//!                     body panic > child panic > body error > child error > value
//! ```
//!
//! ## Rules
//! - Only the first child failure is kept; later ones are logged and discarded.
//! - A `Cancelled` error seen while the scope is already cancelled is not a failure.
//! - Dropping the `open_nursery` future cancels its children.

use std::any::Any;
use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio_util::task::TaskTracker;

use super::scheduler::Handle;
use super::scope::CancelScope;
use crate::error::BridgeError;

enum ChildFailure {
    Error(BridgeError),
    Panic(Box<dyn Any + Send + 'static>),
}

struct NurseryInner {
    handle: Handle,
    scope: CancelScope,
    tracker: TaskTracker,
    failure: Mutex<Option<ChildFailure>>,
}

impl NurseryInner {
    fn fail(&self, failure: ChildFailure) {
        let mut slot = self.failure.lock();
        if slot.is_none() {
            *slot = Some(failure);
            drop(slot);
            self.scope.cancel();
        } else if let ChildFailure::Error(err) = failure {
            tracing::debug!(error = %err, "nursery child failed after first failure");
        } else {
            tracing::debug!("nursery child panicked after first failure");
        }
    }
}

/// Handle for starting supervised children; cheap to clone.
#[derive(Clone)]
pub struct Nursery {
    inner: Arc<NurseryInner>,
}

impl Nursery {
    fn new(handle: Handle) -> Self {
        Self {
            inner: Arc::new(NurseryInner {
                handle,
                scope: CancelScope::new(),
                tracker: TaskTracker::new(),
                failure: Mutex::new(None),
            }),
        }
    }

    /// Starts `fut` as a child.
    ///
    /// Fails with [`BridgeError::NurseryClosed`] once the nursery has been joined.
    pub fn start_soon<F>(&self, fut: F) -> Result<(), BridgeError>
    where
        F: Future<Output = Result<(), BridgeError>> + Send + 'static,
    {
        let tracker = &self.inner.tracker;
        if tracker.is_closed() && tracker.is_empty() {
            return Err(BridgeError::NurseryClosed);
        }

        let inner = Arc::clone(&self.inner);
        let child = tracker.track_future(async move {
            match AssertUnwindSafe(inner.scope.run(fut)).catch_unwind().await {
                Ok(None) | Ok(Some(Ok(()))) => {}
                Ok(Some(Err(BridgeError::Cancelled))) if inner.scope.is_cancelled() => {}
                Ok(Some(Err(err))) => inner.fail(ChildFailure::Error(err)),
                Err(payload) => inner.fail(ChildFailure::Panic(payload)),
            }
        });
        drop(self.inner.handle.spawn(child));
        Ok(())
    }

    /// Cancels the nursery's scope: the body and every child.
    pub fn cancel(&self) {
        self.inner.scope.cancel();
    }

    /// The nursery's cancel scope.
    pub fn scope(&self) -> &CancelScope {
        &self.inner.scope
    }

    /// Number of children still running.
    pub fn len(&self) -> usize {
        self.inner.tracker.len()
    }

    /// Whether no child is running.
    pub fn is_empty(&self) -> bool {
        self.inner.tracker.is_empty()
    }
}

/// Opens a nursery, runs `body` with it, then joins every child.
///
/// Returns the body's value when neither the body nor a child failed. A body that
/// was cancelled through [`Nursery::cancel`] without any failure gives
/// [`BridgeError::Cancelled`]. Panics from the body or a child are resumed after the
/// join.
///
/// # Panics
/// Panics when polled outside of a guest task.
pub async fn open_nursery<B, Fut, T>(body: B) -> Result<T, BridgeError>
where
    B: FnOnce(Nursery) -> Fut,
    Fut: Future<Output = Result<T, BridgeError>>,
{
    let nursery = Nursery::new(Handle::current());
    let inner = Arc::clone(&nursery.inner);
    let guard = inner.scope.token().clone().drop_guard();

    let body = AssertUnwindSafe(inner.scope.run(body(nursery)))
        .catch_unwind()
        .await;
    if matches!(body, Ok(Some(Err(_))) | Err(_)) {
        inner.scope.cancel();
    }

    inner.tracker.close();
    inner.tracker.wait().await;
    guard.disarm();

    let child = inner.failure.lock().take();
    let body = match body {
        Ok(body) => body,
        Err(payload) => resume_unwind(payload),
    };
    let child = match child {
        Some(ChildFailure::Panic(payload)) => resume_unwind(payload),
        Some(ChildFailure::Error(err)) => Some(err),
        None => None,
    };

    match (body, child) {
        (Some(Err(BridgeError::Cancelled)), Some(child)) => Err(child),
        (Some(Err(err)), _) => Err(err),
        (Some(Ok(_)) | None, Some(child)) => Err(child),
        (Some(Ok(value)), None) => Ok(value),
        (None, None) => Err(BridgeError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::{MockClock, sleep};
    use crate::outcome::Outcome;
    use crate::testing::block_on_guest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn mock() -> Option<Arc<dyn crate::guest::Clock>> {
        Some(Arc::new(MockClock::autojump()))
    }

    #[test]
    fn test_joins_all_children() {
        let finished = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&finished);

        let outcome = block_on_guest(mock(), async move {
            open_nursery(|n| async move {
                for i in 1..=3u64 {
                    let f = Arc::clone(&f);
                    n.start_soon(async move {
                        sleep(Duration::from_secs(i)).await;
                        f.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    })?;
                }
                Ok("body")
            })
            .await
        });
        assert_eq!(outcome.unwrap().ok(), Some("body"));
        assert_eq!(finished.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_child_error_cancels_siblings() {
        let outcome = block_on_guest(mock(), async {
            let started = crate::guest::Handle::current().now();
            let res = open_nursery(|n| async move {
                n.start_soon(async {
                    sleep(Duration::from_secs(1)).await;
                    Err(BridgeError::failed("child"))
                })?;
                n.start_soon(async {
                    sleep(Duration::from_secs(100)).await;
                    Ok(())
                })?;
                sleep(Duration::from_secs(50)).await;
                Ok(())
            })
            .await;
            Ok((res, crate::guest::Handle::current().now() - started))
        });
        match outcome {
            Outcome::Value((Err(BridgeError::Failed { error }), elapsed)) => {
                assert_eq!(error, "child");
                assert_eq!(elapsed, Duration::from_secs(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_child_panic_is_resumed() {
        let outcome = block_on_guest(mock(), async {
            open_nursery(|n| async move {
                n.start_soon(async { panic!("child exploded") })?;
                Ok(())
            })
            .await
        });
        assert_eq!(outcome.panic_message(), Some("child exploded"));
    }

    #[test]
    fn test_cancelled_body_without_failure() {
        let outcome = block_on_guest(mock(), async {
            open_nursery(|n| async move {
                n.cancel();
                sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await
        });
        assert!(matches!(outcome, Outcome::Error(BridgeError::Cancelled)));
    }

    #[test]
    fn test_start_after_join_is_rejected() {
        let outcome = block_on_guest(mock(), async {
            let mut kept = None;
            open_nursery(|n| {
                kept = Some(n.clone());
                async { Ok(()) }
            })
            .await?;
            let n = kept.expect("nursery handed to body");
            Ok(n.start_soon(async { Ok(()) }))
        });
        assert!(matches!(
            outcome,
            Outcome::Value(Err(BridgeError::NurseryClosed))
        ));
    }
}
