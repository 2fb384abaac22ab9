//! # Reentry primitive: how the guest asks the host for a turn on its thread.
//!
//! One custom [`EventType`] is claimed per process. Each [`WakeRequest`] carries one
//! deferred callback, is posted to the host loop addressed to a [`ReentryTarget`], and is
//! consumed exactly once when the host dispatches it.
//!
//! ```text
//! guest (any thread)                         host thread
//!   post(host, target, cb) ──► host queue ──► ReentryTarget::event()
//!                                                └─► cb()   (then "not handled further")
//! ```
//!
//! ## Rules
//! - Registration is process-wide, init-once, with no unregister: a second
//!   `register_*` call fails with [`BridgeError::EventTypeAlreadyRegistered`].
//! - [`post`] never blocks and never runs the callback synchronously; ordering and
//!   durability come from the host loop's own queue.
//! - The target always reports the event as not handled further.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BridgeError;
use crate::host::{EventTarget, EventType, HostLoop, PostedEvent};

/// Deferred zero-argument callback run on the host thread.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Process-wide registration, see [`register_event_type`].
static REGISTRATION: Registration = Registration::new();

/// Holder of the claimed reentry event type.
///
/// The crate keeps a single process-wide instance; separate instances exist only so the
/// claim logic can be exercised in isolation.
pub(crate) struct Registration {
    event_type: Mutex<Option<EventType>>,
}

impl Registration {
    pub(crate) const fn new() -> Self {
        Self {
            event_type: parking_lot::const_mutex(None),
        }
    }

    pub(crate) fn get(&self) -> Option<EventType> {
        *self.event_type.lock()
    }

    pub(crate) fn register<H: HostLoop + ?Sized>(
        &self,
        host: &H,
        requested: Option<EventType>,
    ) -> Result<EventType, BridgeError> {
        let mut slot = self.event_type.lock();

        if let Some(event_type) = *slot {
            return Err(BridgeError::EventTypeAlreadyRegistered { event_type });
        }

        let returned = host
            .register_event_type(requested)
            .ok_or(BridgeError::EventTypeRegistrationFailed)?;

        if let Some(requested) = requested {
            if returned != requested {
                return Err(BridgeError::RequestedEventTypeUnavailable {
                    requested,
                    returned,
                });
            }
        }

        *slot = Some(returned);
        tracing::info!(event_type = returned.get(), "reentry event type registered");
        Ok(returned)
    }

    #[cfg(any(test, feature = "test-util"))]
    pub(crate) fn reset(&self) {
        *self.event_type.lock() = None;
    }
}

/// Returns the registered reentry event type, if any.
pub fn registered_event_type() -> Option<EventType> {
    REGISTRATION.get()
}

/// Claims a reentry event type from `host`.
///
/// Fails with [`BridgeError::EventTypeAlreadyRegistered`] if one is already claimed and
/// with [`BridgeError::EventTypeRegistrationFailed`] if the host cannot supply one.
pub fn register_event_type<H: HostLoop + ?Sized>(host: &H) -> Result<EventType, BridgeError> {
    REGISTRATION.register(host, None)
}

/// Claims exactly `requested` as the reentry event type.
///
/// In addition to the failures of [`register_event_type`], fails with
/// [`BridgeError::RequestedEventTypeUnavailable`] when the host hands out a different
/// type. The host-side allocation is not rolled back in that case.
pub fn register_requested_event_type<H: HostLoop + ?Sized>(
    host: &H,
    requested: EventType,
) -> Result<EventType, BridgeError> {
    REGISTRATION.register(host, Some(requested))
}

/// Forgets the process-wide registration.
#[cfg(any(test, feature = "test-util"))]
pub(crate) fn reset_registration() {
    REGISTRATION.reset();
}

/// A posted request to run one callback on the host thread.
pub struct WakeRequest {
    callback: Callback,
}

impl WakeRequest {
    /// Wraps `callback`.
    pub fn new(callback: Callback) -> Self {
        Self { callback }
    }

    /// Packs the request into a host event of type `event_type`.
    pub fn into_event(self, event_type: EventType) -> PostedEvent {
        PostedEvent::new(event_type, self)
    }

    /// Runs the callback, consuming the request.
    pub fn invoke(self) {
        (self.callback)();
    }
}

impl fmt::Debug for WakeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WakeRequest").finish_non_exhaustive()
    }
}

/// Host-addressable receiver of [`WakeRequest`]s.
#[derive(Debug, Clone, Copy)]
pub struct ReentryTarget {
    event_type: EventType,
}

impl ReentryTarget {
    /// Creates a target answering to `event_type`.
    pub fn new(event_type: EventType) -> Self {
        Self { event_type }
    }

    /// The event type this target answers to.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }
}

impl EventTarget for ReentryTarget {
    fn event(&self, event: PostedEvent) -> bool {
        if event.event_type() != self.event_type {
            return false;
        }
        match event.into_payload::<WakeRequest>() {
            Ok(request) => request.invoke(),
            Err(event) => {
                tracing::warn!(
                    event_type = event.event_type().get(),
                    "reentry event without a wake request"
                );
            }
        }
        false
    }
}

/// Posts `callback` to run on the host thread via `target`.
pub fn post<H: HostLoop + ?Sized>(host: &H, target: &Arc<ReentryTarget>, callback: Callback) {
    let event = WakeRequest::new(callback).into_event(target.event_type());
    host.post_event(Arc::clone(target) as Arc<dyn EventTarget>, event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::EventLoop;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Host whose allocator always fails.
    struct Exhausted(EventLoop);

    impl HostLoop for Exhausted {
        fn register_event_type(&self, _hint: Option<EventType>) -> Option<EventType> {
            None
        }
        fn post_event(&self, target: Arc<dyn EventTarget>, event: PostedEvent) {
            self.0.post_event(target, event);
        }
        fn exec(&self) -> i32 {
            self.0.exec()
        }
        fn exit(&self, code: i32) {
            self.0.exit(code);
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let reg = Registration::new();
        let host = EventLoop::new();

        let first = reg.register(&host, None).expect("first registration");
        assert_eq!(reg.get(), Some(first));

        match reg.register(&host, None) {
            Err(BridgeError::EventTypeAlreadyRegistered { event_type }) => {
                assert_eq!(event_type, first)
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            reg.register(&host, Some(EventType::new(3000))),
            Err(BridgeError::EventTypeAlreadyRegistered { .. })
        ));
    }

    #[test]
    fn test_allocator_failure() {
        let reg = Registration::new();
        let host = Exhausted(EventLoop::new());
        assert!(matches!(
            reg.register(&host, None),
            Err(BridgeError::EventTypeRegistrationFailed)
        ));
        assert_eq!(reg.get(), None);
    }

    #[test]
    fn test_requested_unavailable() {
        let reg = Registration::new();
        let host = EventLoop::new();
        let requested = EventType::new(4000);
        host.register_event_type(Some(requested));

        match reg.register(&host, Some(requested)) {
            Err(BridgeError::RequestedEventTypeUnavailable {
                requested: r,
                returned,
            }) => {
                assert_eq!(r, requested);
                assert_eq!(returned, EventType::MAX_USER);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(reg.get(), None);
    }

    #[test]
    fn test_requested_granted_and_reset() {
        let reg = Registration::new();
        let host = EventLoop::new();
        let requested = EventType::new(4001);
        assert_eq!(reg.register(&host, Some(requested)).ok(), Some(requested));

        reg.reset();
        assert_eq!(reg.get(), None);
        assert!(reg.register(&host, None).is_ok());
    }

    #[test]
    fn test_post_is_deferred_and_runs_once() {
        let host = EventLoop::new();
        let target = Arc::new(ReentryTarget::new(EventType::USER));
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let hits = Arc::clone(&hits);
            post(
                &host,
                &target,
                Box::new(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert_eq!(host.process_pending(), Some(10));
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(host.process_pending(), Some(0));
    }

    #[test]
    fn test_target_ignores_other_types() {
        let target = ReentryTarget::new(EventType::USER);
        let hit = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hit);
        let request = WakeRequest::new(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));

        assert!(!target.event(request.into_event(EventType::new(1001))));
        assert_eq!(hit.load(Ordering::SeqCst), 0);

        let h = Arc::clone(&hit);
        let request = WakeRequest::new(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert!(!target.event(request.into_event(EventType::USER)));
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }
}
