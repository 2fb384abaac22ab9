//! # Runner: one guest run inside one host loop.
//!
//! The [`Runner`] owns the wiring between a [`HostLoop`] and a guest run:
//! it resolves the reentry event type, starts the guest with a reentry hook that posts
//! through the host, optionally drives the host loop, and records both sides in
//! [`Outcomes`].
//!
//! ## Flow
//! ```text
//! run(main)
//!   ├─► state != Idle                       → Err(RunnerAlreadyStarted)
//!   ├─► resolve event type (register once)  → publish EventTypeRegistered
//!   ├─► Idle → Registered                   (checked again under the same lock)
//!   ├─► start_guest_run(guest_main(main))   → publish GuestStarted
//!   │        reentry(cb) = post(host, target, cb)
//!   │        done(outcome) = on_guest_done
//!   ├─► execute_application?
//!   │     no  → return empty Outcomes
//!   │     yes → code = host.exec()
//!   │           on_host_done(code)          → publish HostExited
//!   └─► return Outcomes{ host, guest }
//!
//! on_guest_done(outcome)            (host thread)
//!   ├─► scope cancelled cleanly? record Outcome::Cancelled
//!   ├─► publish GuestFinished | GuestFailed
//!   ├─► record guest outcome
//!   ├─► done_callback(&outcomes)
//!   ├─► quit_application? host.quit() → publish QuitRequested
//!   └─► done = true
//! ```
//!
//! ## Rules
//! - A runner runs at most once; a second `run` fails without touching the host.
//! - The done callback is invoked at most once, before the host is asked to quit.
//! - If the host exits before the guest finished, the guest's tasks are dropped and the
//!   guest slot of the outcomes stays empty.

use std::future::Future;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::config::RunnerConfig;
use crate::error::BridgeError;
use crate::events::{Event, EventKind};
use crate::guest::{CancelScope, Clock, GuestRunConfig, Handle, start_guest_run};
use crate::host::{EventType, HostLoop};
use crate::outcome::{Outcome, Outcomes, payload_message};
use crate::reentry::{self, ReentryTarget};
use crate::subscribers::SubscriberSet;

use super::builder::RunnerBuilder;
use super::main_task::guest_main;
use super::state::RunnerState;

/// Callback receiving the outcomes once the guest finished.
pub type DoneCallback<T> = Box<dyn FnOnce(&Outcomes<T>) + Send + 'static>;

/// Runs a guest main task inside a host loop.
///
/// Cheap to clone; clones share the same run.
pub struct Runner<T> {
    inner: Arc<RunnerInner<T>>,
}

impl<T> Clone for Runner<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(super) struct RunnerInner<T> {
    pub(super) host: Arc<dyn HostLoop>,
    pub(super) config: RunnerConfig,
    pub(super) scope: CancelScope,
    clock: Option<Arc<dyn Clock>>,
    subscribers: SubscriberSet,
    done_callback: Mutex<Option<DoneCallback<T>>>,
    outcomes: Mutex<Outcomes<T>>,
    state: Mutex<RunnerState>,
    guest: Mutex<Option<Handle>>,
    done: AtomicBool,
}

impl<T: Send + 'static> Runner<T> {
    /// Starts building a runner on `host`.
    pub fn builder(host: Arc<dyn HostLoop>) -> RunnerBuilder<T> {
        RunnerBuilder::new(host)
    }

    pub(super) fn new_internal(
        host: Arc<dyn HostLoop>,
        config: RunnerConfig,
        clock: Option<Arc<dyn Clock>>,
        subscribers: SubscriberSet,
        done_callback: Option<DoneCallback<T>>,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                host,
                config,
                scope: CancelScope::new(),
                clock,
                subscribers,
                done_callback: Mutex::new(done_callback),
                outcomes: Mutex::new(Outcomes::new()),
                state: Mutex::new(RunnerState::Idle),
                guest: Mutex::new(None),
                done: AtomicBool::new(false),
            }),
        }
    }

    /// Runs `main` as the guest's main task.
    ///
    /// With `execute_application` set, blocks in the host loop until it exits and
    /// returns both outcomes. Otherwise returns empty outcomes right after starting the
    /// guest; poll [`is_done`](Self::is_done) and collect with
    /// [`take_outcomes`](Self::take_outcomes).
    ///
    /// # Errors
    /// - [`BridgeError::RunnerAlreadyStarted`] on a second call;
    /// - registration errors when no reentry event type could be allocated.
    pub fn run<F>(&self, main: F) -> Result<Outcomes<T>, BridgeError>
    where
        F: Future<Output = Result<T, BridgeError>> + Send + 'static,
    {
        let inner = &self.inner;
        if inner.state.lock().is_started() {
            return Err(BridgeError::RunnerAlreadyStarted);
        }

        let event_type = inner.resolve_event_type()?;
        inner.claim()?;

        let target = Arc::new(ReentryTarget::new(event_type));
        let host = Arc::clone(&inner.host);
        let done_inner = Arc::clone(inner);
        let mut guest_config = GuestRunConfig::new(
            move |callback| reentry::post(&*host, &target, callback),
            move |outcome| done_inner.on_guest_done(outcome),
        );
        guest_config.clock = inner.clock.clone();

        inner.set_state(RunnerState::Running);
        let handle = start_guest_run(guest_main(Arc::clone(inner), main), guest_config);
        *inner.guest.lock() = Some(handle);
        inner.publish(Event::new(EventKind::GuestStarted));

        if !inner.config.execute_application {
            return Ok(Outcomes::new());
        }

        let code = inner.host.exec();
        inner.on_host_done(code);
        inner.set_state(RunnerState::Finalized);
        Ok(self.take_outcomes())
    }

    /// Cancels the guest's main task.
    ///
    /// The run then ends cleanly: the guest outcome is [`Outcome::Cancelled`] and
    /// [`Outcomes::unwrap`] resolves to [`Resolved::Cancelled`](crate::Resolved::Cancelled).
    pub fn cancel(&self) {
        self.inner.scope.cancel();
        self.inner
            .publish(Event::new(EventKind::CancelRequested).with_reason("runner cancelled"));
    }

    /// Whether the guest finished and the done sequence completed.
    pub fn is_done(&self) -> bool {
        self.inner.done.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunnerState {
        *self.inner.state.lock()
    }

    /// The configuration this runner was built with.
    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    /// Moves the recorded outcomes out, leaving empty ones behind.
    pub fn take_outcomes(&self) -> Outcomes<T> {
        mem::take(&mut *self.inner.outcomes.lock())
    }
}

impl<T> RunnerInner<T> {
    pub(super) fn publish(&self, event: Event) {
        self.subscribers.emit(&event);
    }

    /// Moves `Idle → Registered`; fails if another `run` got there first.
    fn claim(&self) -> Result<(), BridgeError> {
        let mut state = self.state.lock();
        if state.is_started() {
            return Err(BridgeError::RunnerAlreadyStarted);
        }
        tracing::trace!(from = state.as_label(), to = "registered", "runner state");
        *state = RunnerState::Registered;
        Ok(())
    }

    fn set_state(&self, next: RunnerState) {
        let mut state = self.state.lock();
        tracing::trace!(from = state.as_label(), to = next.as_label(), "runner state");
        *state = next;
    }

    /// Reuses the process-wide event type, registering it on first use.
    fn resolve_event_type(&self) -> Result<EventType, BridgeError> {
        if let Some(event_type) = reentry::registered_event_type() {
            return Ok(event_type);
        }
        match reentry::register_event_type(&*self.host) {
            Ok(event_type) => {
                self.publish(
                    Event::new(EventKind::EventTypeRegistered).with_code(event_type.get()),
                );
                Ok(event_type)
            }
            Err(BridgeError::EventTypeAlreadyRegistered { event_type }) => Ok(event_type),
            Err(err) => {
                tracing::error!(
                    label = err.as_label(),
                    error = %err,
                    "reentry registration failed"
                );
                Err(err)
            }
        }
    }

    fn on_guest_done(&self, outcome: Outcome<Option<T>>) {
        let outcome = match outcome {
            Outcome::Value(Some(value)) => Outcome::Value(value),
            Outcome::Value(None) | Outcome::Cancelled => Outcome::Cancelled,
            Outcome::Error(err) => Outcome::Error(err),
            Outcome::Panic(payload) => Outcome::Panic(payload),
        };
        match &outcome {
            Outcome::Value(_) => self.publish(Event::new(EventKind::GuestFinished)),
            Outcome::Cancelled => {
                tracing::debug!("guest main task cancelled");
                self.publish(Event::new(EventKind::GuestFinished).with_reason("cancelled"));
            }
            Outcome::Error(err) => {
                if !err.is_cancellation() {
                    tracing::error!(label = err.as_label(), error = %err, "guest run failed");
                }
                self.publish(Event::new(EventKind::GuestFailed).with_reason(err.to_string()));
            }
            Outcome::Panic(_) => {
                let info = outcome.panic_message().unwrap_or("unknown panic");
                tracing::error!(info, "guest main task panicked");
                self.publish(Event::new(EventKind::GuestFailed).with_reason(info));
            }
        }

        if let Err(err) = self.outcomes.lock().record_guest(outcome) {
            tracing::error!(error = %err, "guest outcome dropped");
        }
        self.set_state(RunnerState::GuestDone);

        let callback = self.done_callback.lock().take();
        if let Some(callback) = callback {
            let outcomes = mem::take(&mut *self.outcomes.lock());
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(&outcomes))) {
                tracing::warn!(
                    info = payload_message(panic.as_ref()).unwrap_or("unknown panic"),
                    "done callback panicked"
                );
            }
            *self.outcomes.lock() = outcomes;
        }

        if self.config.quit_application {
            self.host.quit();
            self.publish(Event::new(EventKind::QuitRequested));
        }
        self.done.store(true, Ordering::Release);
    }

    fn on_host_done(&self, code: i32) {
        if let Err(err) = self
            .outcomes
            .lock()
            .record_host(Outcome::from_return_code(code))
        {
            tracing::error!(error = %err, "host outcome dropped");
        }
        self.publish(Event::new(EventKind::HostExited).with_code(code));

        if !self.done.load(Ordering::Acquire) {
            tracing::warn!(code, "host loop exited before the guest finished");
            let guest = self.guest.lock().take();
            if let Some(guest) = guest {
                guest.shutdown();
            }
        }
        self.set_state(RunnerState::HostDone);
    }
}
