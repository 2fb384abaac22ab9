//! # Emissions nursery: signal slots that start supervised guest tasks.
//!
//! Host callbacks cannot return errors anywhere useful. Here every firing of a connected
//! signal starts its handler as a child of a [`Nursery`], so a failing handler fails the
//! nursery instead of vanishing.
//!
//! ```text
//! Signal::emit(args) ──► starter slot (host thread)
//!                            └─► nursery.start_soon( wrapper?( handler(args) ) )
//!
//! open_emissions_nursery:
//!   open_nursery ──► body(en) ──► [until fired] ──► disconnect_all ──► join children
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::wait::SignalWaiter;
use crate::error::BridgeError;
use crate::guest::{Nursery, open_nursery};
use crate::host::{ConnectionStack, Signal};

/// Boxed handler invocation passed to a [`SlotWrapper`].
pub type SlotFuture = Pin<Box<dyn Future<Output = Result<(), BridgeError>> + Send + 'static>>;

/// Runs around every handler started by an [`EmissionsNursery`].
///
/// A wrapper can contain failures (log them, show a dialog) so they do not cancel the
/// whole nursery.
#[async_trait]
pub trait SlotWrapper: Send + Sync + 'static {
    /// Awaits `slot` and decides what its result means for the nursery.
    async fn wrap(&self, slot: SlotFuture) -> Result<(), BridgeError>;
}

/// Wrapper that logs handler errors and swallows them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportErrors;

#[async_trait]
impl SlotWrapper for ReportErrors {
    async fn wrap(&self, slot: SlotFuture) -> Result<(), BridgeError> {
        if let Err(err) = slot.await {
            tracing::warn!(label = err.as_label(), error = %err, "signal handler failed");
        }
        Ok(())
    }
}

/// Connects signals to handlers that run as nursery children.
#[derive(Clone)]
pub struct EmissionsNursery {
    nursery: Nursery,
    connections: Arc<Mutex<ConnectionStack>>,
    wrapper: Option<Arc<dyn SlotWrapper>>,
}

impl EmissionsNursery {
    /// Starts `handler(args)` as a child on every firing of `signal`.
    ///
    /// Does not wait for the handler. Firings after the nursery has been joined are
    /// ignored.
    pub fn connect<A, F, Fut>(&self, signal: &Signal<A>, handler: F)
    where
        A: Clone + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BridgeError>> + Send + 'static,
    {
        let nursery = self.nursery.clone();
        let wrapper = self.wrapper.clone();
        let source = signal.id();

        let connection = signal.connect(move |args| {
            let slot = handler(args);
            let started = match &wrapper {
                Some(wrapper) => {
                    let wrapper = Arc::clone(wrapper);
                    nursery.start_soon(async move { wrapper.wrap(Box::pin(slot)).await })
                }
                None => nursery.start_soon(slot),
            };
            if let Err(err) = started {
                tracing::debug!(source = source.get(), error = %err, "handler not started");
            }
        });
        self.connections.lock().push(connection);
    }

    /// Like [`connect`](Self::connect) for a non-suspending handler.
    ///
    /// The handler still runs inside a child task, so a panic fails the nursery.
    pub fn connect_sync<A, F>(&self, signal: &Signal<A>, handler: F)
    where
        A: Clone + Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.connect(signal, move |args| {
            let handler = Arc::clone(&handler);
            async move {
                handler(args);
                Ok(())
            }
        });
    }

    /// Releases every connection, most recent first.
    pub fn disconnect_all(&self) {
        self.connections.lock().close();
    }

    /// The underlying nursery, for starting tasks directly.
    pub fn nursery(&self) -> &Nursery {
        &self.nursery
    }
}

/// Options of [`open_emissions_nursery`].
#[derive(Default)]
pub struct NurseryOptions {
    until: Option<SignalWaiter>,
    wrapper: Option<Arc<dyn SlotWrapper>>,
}

impl NurseryOptions {
    /// Default options: no `until`, no wrapper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the nursery open until `signal` fires.
    ///
    /// The signal is connected right away, so a firing during the body counts.
    pub fn until<A>(mut self, signal: &Signal<A>) -> Self
    where
        A: Clone + Send + 'static,
    {
        self.until = Some(SignalWaiter::new(signal));
        self
    }

    /// Runs every handler through `wrapper`.
    pub fn wrapper<W: SlotWrapper>(mut self, wrapper: W) -> Self {
        self.wrapper = Some(Arc::new(wrapper));
        self
    }
}

/// Opens a nursery whose signal handlers run as supervised children.
///
/// After `body` succeeds, waits for the `until` signal (if any), then disconnects every
/// handler and joins the children. Handler failures not intercepted by the wrapper fail
/// the nursery and cancel the body.
pub async fn open_emissions_nursery<B, Fut, T>(
    options: NurseryOptions,
    body: B,
) -> Result<T, BridgeError>
where
    B: FnOnce(EmissionsNursery) -> Fut,
    Fut: Future<Output = Result<T, BridgeError>>,
{
    let NurseryOptions { until, wrapper } = options;

    open_nursery(move |nursery| async move {
        let emissions = EmissionsNursery {
            nursery,
            connections: Arc::new(Mutex::new(ConnectionStack::new())),
            wrapper,
        };

        let result = body(emissions.clone()).await;
        if result.is_ok() {
            if let Some(until) = until {
                until.wait().await;
            }
        }
        emissions.disconnect_all();
        result
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guest::{MockClock, sleep, spawn, yield_now};
    use crate::outcome::Outcome;
    use crate::testing::block_on_guest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_handlers_run_until_signal() {
        let clicked = Signal::<u32>::new("clicked");
        let closed = Signal::<()>::new("closed");
        let total = Arc::new(AtomicUsize::new(0));

        let (c, x, t) = (clicked.clone(), closed.clone(), Arc::clone(&total));
        let outcome = block_on_guest(None, async move {
            let (c2, x2) = (c.clone(), x.clone());
            let _ = spawn(async move {
                yield_now().await;
                c2.emit(1);
                c2.emit(2);
                yield_now().await;
                x2.emit(());
            });

            let (t2, c3) = (Arc::clone(&t), c.clone());
            open_emissions_nursery(NurseryOptions::new().until(&x), |en| async move {
                en.connect_sync(&c3, move |v| {
                    t2.fetch_add(v as usize, Ordering::SeqCst);
                });
                Ok(())
            })
            .await?;
            Ok(c.connection_count())
        });
        assert_eq!(outcome.unwrap().ok(), Some(0));
        assert_eq!(total.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_handler_error_fails_nursery() {
        let sig = Signal::<()>::new("sig");
        let s = sig.clone();
        let outcome = block_on_guest(Some(Arc::new(MockClock::autojump())), async move {
            open_emissions_nursery(NurseryOptions::new(), |en| async move {
                en.connect(&s, |()| async { Err(BridgeError::failed("handler")) });
                s.emit(());
                sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await
        });
        match outcome {
            Outcome::Error(BridgeError::Failed { error }) => assert_eq!(error, "handler"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_wrapper_contains_failures() {
        let sig = Signal::<()>::new("sig");
        let s = sig.clone();
        let outcome = block_on_guest(Some(Arc::new(MockClock::autojump())), async move {
            open_emissions_nursery(NurseryOptions::new().wrapper(ReportErrors), |en| async move {
                en.connect(&s, |()| async { Err(BridgeError::failed("handler")) });
                s.emit(());
                s.emit(());
                sleep(Duration::from_secs(1)).await;
                Ok("survived")
            })
            .await
        });
        assert_eq!(outcome.unwrap().ok(), Some("survived"));
    }
}
