//! # Lifecycle events published by the runner.
//!
//! The [`EventKind`] enum classifies events across three phases:
//! - **Setup**: reentry registration and guest start
//! - **Guest completion**: finished, failed, timed out, cancelled
//! - **Host completion**: quit requested, host loop exited
//!
//! The [`Event`] struct carries metadata such as timestamps, reasons, exit codes and
//! the configured timeout.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use loopbridge::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TimeoutHit)
//!     .with_reason("guest too slow")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TimeoutHit);
//! assert_eq!(ev.timeout_ms, Some(5000));
//! assert_eq!(ev.reason.as_deref(), Some("guest too slow"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runner events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Setup ===
    /// The runner claimed the process-wide reentry event type.
    ///
    /// Sets:
    /// - `code`: the raw event type id
    EventTypeRegistered,

    /// The guest run was started and is waiting for its first tick.
    GuestStarted,

    // === Guest completion ===
    /// The guest's main task returned a value or was cancelled cleanly.
    ///
    /// Sets:
    /// - `reason`: `"cancelled"` for a clean cancellation
    GuestFinished,

    /// The guest's main task returned an error or panicked.
    ///
    /// Sets:
    /// - `reason`: error message or panic message
    GuestFailed,

    /// The runner's overall deadline expired.
    ///
    /// Sets:
    /// - `timeout_ms`: configured runner timeout (ms)
    TimeoutHit,

    /// The guest's cancel scope was cancelled (window closed or [`Runner::cancel`]).
    ///
    /// Sets:
    /// - `reason`: what requested the cancellation
    ///
    /// [`Runner::cancel`]: crate::Runner::cancel
    CancelRequested,

    // === Host completion ===
    /// The runner asked the host loop to quit after the guest finished.
    QuitRequested,

    /// The host loop's blocking run returned.
    ///
    /// Sets:
    /// - `code`: the host exit status
    HostExited,
}

/// Runner event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Human-readable reason (errors, cancellation source).
    pub reason: Option<Arc<str>>,
    /// Exit status or event type id.
    pub code: Option<i32>,
    /// Runner timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            reason: None,
            code: None,
            timeout_ms: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an exit status or id.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Whether this event ends the guest run.
    #[inline]
    pub fn is_guest_terminal(&self) -> bool {
        matches!(self.kind, EventKind::GuestFinished | EventKind::GuestFailed)
    }
}
