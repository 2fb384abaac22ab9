//! # The guest's top-level task.
//!
//! Wraps the user's main future with the runner-wide cancel scope, the optional
//! overall deadline and the host's "last window closed" notification.
//!
//! ```text
//! guest_main(main)
//!   ├─► quit_on_last_window_closed? connect last_window_closed → scope.cancel()
//!   └─► scope.run(
//!         timeout? fail_after(timeout, main) : main
//!       )
//!         ├─ Some(Ok(v))         → Ok(Some(v))
//!         ├─ Some(Err(e))        → Err(e)
//!         ├─ runner deadline hit → publish TimeoutHit, Err(RunnerTimedOut)
//!         └─ None (cancelled)    → Ok(None)
//! ```
//!
//! The runner scope absorbs its own cancellation: `Ok(None)` is recorded as
//! [`Outcome::Cancelled`](crate::Outcome::Cancelled), a clean exit.
//!
//! A [`TooSlow`](crate::BridgeError::TooSlow) raised by a deadline nested inside the
//! user's code passes through unchanged; only the runner's own deadline maps to
//! [`RunnerTimedOut`](crate::BridgeError::RunnerTimedOut).

use std::future::Future;
use std::sync::Arc;

use crate::error::BridgeError;
use crate::events::{Event, EventKind};
use crate::guest::fail_after;
use crate::host::Connection;

use super::bridge::RunnerInner;

pub(super) async fn guest_main<T, F>(
    inner: Arc<RunnerInner<T>>,
    main: F,
) -> Result<Option<T>, BridgeError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, BridgeError>> + Send + 'static,
{
    let _window = watch_last_window(&inner);

    match inner.scope.run(with_timeout(&inner, main)).await {
        Some(result) => result.map(Some),
        None => Ok(None),
    }
}

async fn with_timeout<T, F>(inner: &RunnerInner<T>, main: F) -> Result<T, BridgeError>
where
    F: Future<Output = Result<T, BridgeError>>,
{
    let Some(timeout) = inner.config.timeout() else {
        return main.await;
    };
    match fail_after(timeout, main).await {
        Ok(result) => result,
        Err(_too_slow) => {
            inner.publish(Event::new(EventKind::TimeoutHit).with_timeout(timeout));
            Err(BridgeError::RunnerTimedOut { timeout })
        }
    }
}

fn watch_last_window<T: Send + 'static>(inner: &Arc<RunnerInner<T>>) -> Option<Connection> {
    if !inner.host.quit_on_last_window_closed() {
        return None;
    }
    let signal = inner.host.last_window_closed()?;
    let weak = Arc::downgrade(inner);
    Some(signal.connect(move |()| {
        if let Some(inner) = weak.upgrade() {
            inner.scope.cancel();
            inner.publish(Event::new(EventKind::CancelRequested).with_reason("last window closed"));
        }
    }))
}
