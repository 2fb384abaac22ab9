//! Host loop seam: the externally-owned event loop the guest runs inside.
//!
//! The bridge only needs a narrow capability from the host:
//! - allocate a custom [`EventType`] and deliver [`PostedEvent`]s of that type to an
//!   [`EventTarget`] on the host thread;
//! - post such events from any thread without blocking;
//! - a blocking [`HostLoop::exec`] returning an exit status, and [`HostLoop::exit`];
//! - push-style notifications ([`Signal`]) with synchronous, ordered delivery.
//!
//! ## Contents
//! - [`HostLoop`], [`EventTarget`], [`PostedEvent`], [`EventType`] the seam itself
//! - [`Signal`], [`Connection`], [`ConnectionStack`], [`SourceId`] event sources
//! - [`EventLoop`] a complete in-process host used by tests and demos
//!
//! ```text
//! any thread ── post_event(target, event) ──► [host queue] ──► exec() on host thread
//!                                                                  └─► target.event(event)
//! ```

mod event_loop;
mod signal;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub use event_loop::EventLoop;
pub use signal::{Connection, ConnectionStack, Signal, SourceId};

/// Identifier of a custom host event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(i32);

impl EventType {
    /// First id available for application-defined event kinds.
    pub const USER: EventType = EventType(1000);
    /// Last id available for application-defined event kinds.
    pub const MAX_USER: EventType = EventType(65535);

    /// Wraps a raw event type id.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether the id lies in the application-defined range.
    #[inline]
    pub fn is_user(self) -> bool {
        (Self::USER.0..=Self::MAX_USER.0).contains(&self.0)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

/// An opaque message posted to the host loop.
///
/// The payload is only interpreted by the [`EventTarget`] it is addressed to.
pub struct PostedEvent {
    event_type: EventType,
    payload: Box<dyn Any + Send>,
}

impl PostedEvent {
    /// Creates an event of the given type carrying `payload`.
    pub fn new<P: Any + Send>(event_type: EventType, payload: P) -> Self {
        Self {
            event_type,
            payload: Box::new(payload),
        }
    }

    /// Returns the event type.
    #[inline]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Extracts the payload if it is a `P`; gives the event back otherwise.
    pub fn into_payload<P: Any>(self) -> Result<P, PostedEvent> {
        let event_type = self.event_type;
        match self.payload.downcast::<P>() {
            Ok(payload) => Ok(*payload),
            Err(payload) => Err(PostedEvent {
                event_type,
                payload,
            }),
        }
    }
}

impl fmt::Debug for PostedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostedEvent")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Receiver of posted events, invoked by the host loop on its own thread.
pub trait EventTarget: Send + Sync + 'static {
    /// Handles one event. Returns `true` if the event was consumed and should not
    /// propagate further.
    fn event(&self, event: PostedEvent) -> bool;
}

/// # Capability the bridge needs from a foreign event loop.
///
/// ### Implementation requirements
/// - [`post_event`](HostLoop::post_event) is callable from any thread, never blocks and
///   never dispatches synchronously.
/// - Events are dispatched on the host thread in posting order.
/// - [`exec`](HostLoop::exec) blocks until [`exit`](HostLoop::exit) is requested and
///   returns the requested status.
pub trait HostLoop: Send + Sync + 'static {
    /// Allocates a custom event type, honouring `hint` when it is free.
    ///
    /// Returns `None` when the allocator is exhausted.
    fn register_event_type(&self, hint: Option<EventType>) -> Option<EventType>;

    /// Queues `event` for delivery to `target`.
    fn post_event(&self, target: Arc<dyn EventTarget>, event: PostedEvent);

    /// Runs the loop on the calling thread until an exit is requested.
    fn exec(&self) -> i32;

    /// Requests the loop to stop with the given status.
    fn exit(&self, code: i32);

    /// Requests the loop to stop with status `0`.
    fn quit(&self) {
        self.exit(0);
    }

    /// Whether closing the last window is meant to end the application.
    fn quit_on_last_window_closed(&self) -> bool {
        false
    }

    /// Notification fired when the last window closes, if the host has windows at all.
    fn last_window_closed(&self) -> Option<Signal<()>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trip_and_mismatch() {
        let ev = PostedEvent::new(EventType::USER, 7u32);
        assert_eq!(ev.event_type(), EventType::USER);

        let ev = match ev.into_payload::<String>() {
            Ok(_) => panic!("payload is not a String"),
            Err(ev) => ev,
        };
        assert_eq!(ev.into_payload::<u32>().ok(), Some(7));
    }

    #[test]
    fn test_user_range() {
        assert!(EventType::USER.is_user());
        assert!(EventType::MAX_USER.is_user());
        assert!(!EventType::new(999).is_user());
        assert_eq!(EventType::new(1234).to_string(), "EventType(1234)");
    }
}
