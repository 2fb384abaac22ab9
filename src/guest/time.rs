//! Guest time: sleeping and deadline scopes.
//!
//! All of these read the clock of the current guest run, so a [`MockClock`] makes them
//! deterministic.
//!
//! [`MockClock`]: super::MockClock

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use super::scheduler::Handle;
use crate::error::TooSlow;

/// Future returned by [`sleep`] and [`sleep_until`].
#[must_use = "futures do nothing unless awaited"]
#[derive(Debug)]
pub struct Sleep {
    handle: Handle,
    deadline: Duration,
    key: Option<u64>,
}

impl Sleep {
    /// Guest time at which the sleep completes.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Whether the deadline has been reached.
    pub fn is_elapsed(&self) -> bool {
        self.handle.now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_elapsed() {
            if let Some(key) = self.key.take() {
                self.handle.cancel_timer(self.deadline, key);
            }
            return Poll::Ready(());
        }
        let key = self.handle.register_timer(self.deadline, self.key, cx.waker());
        self.key = Some(key);
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.handle.cancel_timer(self.deadline, key);
        }
    }
}

/// Sleeps for `duration` of guest time.
///
/// # Panics
/// Panics when called outside of a guest task.
pub fn sleep(duration: Duration) -> Sleep {
    let handle = Handle::current();
    let deadline = handle.now().saturating_add(duration);
    Sleep {
        handle,
        deadline,
        key: None,
    }
}

/// Sleeps until guest time reaches `deadline`.
///
/// # Panics
/// Panics when called outside of a guest task.
pub fn sleep_until(deadline: Duration) -> Sleep {
    Sleep {
        handle: Handle::current(),
        deadline,
        key: None,
    }
}

/// Runs `fut` with a deadline of `timeout`; fails with [`TooSlow`] when it expires.
///
/// `fut` is polled before the deadline is checked, so work that completes in the same
/// tick as the deadline still wins.
pub async fn fail_after<F: Future>(timeout: Duration, fut: F) -> Result<F::Output, TooSlow> {
    let deadline = sleep(timeout);
    tokio::select! {
        biased;
        out = fut => Ok(out),
        _ = deadline => Err(TooSlow { timeout }),
    }
}

/// Runs `fut` with a deadline of `timeout`; gives `None` when it expires.
pub async fn move_on_after<F: Future>(timeout: Duration, fut: F) -> Option<F::Output> {
    fail_after(timeout, fut).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::MockClock;
    use crate::outcome::Outcome;
    use crate::testing::block_on_guest;
    use std::sync::Arc;

    fn mock() -> Option<Arc<dyn crate::guest::Clock>> {
        Some(Arc::new(MockClock::autojump()))
    }

    #[test]
    fn test_sleep_advances_virtual_time() {
        let outcome = block_on_guest(mock(), async {
            let start = Handle::current().now();
            sleep(Duration::from_secs(5)).await;
            sleep(Duration::from_secs(5)).await;
            Ok(Handle::current().now() - start)
        });
        assert_eq!(outcome.unwrap().ok(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_fail_after_expires() {
        let outcome = block_on_guest(mock(), async {
            let res = fail_after(Duration::from_secs(1), sleep(Duration::from_secs(10))).await;
            Ok((res, Handle::current().now()))
        });
        match outcome {
            Outcome::Value((Err(too_slow), now)) => {
                assert_eq!(too_slow.timeout, Duration::from_secs(1));
                assert_eq!(now, Duration::from_secs(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_fast_work_beats_deadline() {
        let outcome = block_on_guest(mock(), async {
            let fast = fail_after(Duration::from_secs(5), async {
                sleep(Duration::from_secs(1)).await;
                "done"
            })
            .await;
            let expired =
                move_on_after(Duration::from_secs(1), sleep(Duration::from_secs(2))).await;
            Ok((fast.ok(), expired))
        });
        assert_eq!(outcome.unwrap().ok(), Some((Some("done"), None)));
    }

    #[test]
    fn test_dropped_sleep_unregisters() {
        let outcome = block_on_guest(mock(), async {
            {
                let mut pending = Box::pin(sleep(Duration::from_secs(100)));
                let waker = futures::task::noop_waker();
                let mut cx = Context::from_waker(&waker);
                assert!(pending.as_mut().poll(&mut cx).is_pending());
            }
            // with the long timer gone, the clock only needs to reach 1s
            sleep(Duration::from_secs(1)).await;
            Ok(Handle::current().now())
        });
        assert_eq!(outcome.unwrap().ok(), Some(Duration::from_secs(1)));
    }
}
