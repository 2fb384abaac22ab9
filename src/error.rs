//! Error types used by the bridge.
//!
//! This module defines:
//!
//! - [`BridgeError`] errors raised by registration, the runner, the guest scheduler
//!   primitives and the emission adapters.
//! - [`TooSlow`] the deadline error produced by [`fail_after`](crate::fail_after).
//!
//! [`BridgeError`] provides helper methods (`as_label`, `as_message`) for logging and
//! the [`BridgeError::is_cancellation`] predicate.

use std::time::Duration;
use thiserror::Error;

use crate::host::EventType;

/// # Errors produced by the bridge.
///
/// Registration errors (`EventType*`, `RequestedEventTypeUnavailable`) are fatal to
/// starting a run. `RunnerTimedOut`, `ReturnCode` and `Failed` travel through
/// [`Outcomes`](crate::Outcomes) and are left to the embedding caller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A reentry event type has already been claimed in this process.
    #[error("reentry event type already registered: {event_type}")]
    EventTypeAlreadyRegistered {
        /// The event type registered earlier.
        event_type: EventType,
    },

    /// The host loop could not allocate an event type.
    #[error("host loop failed to register an event type")]
    EventTypeRegistrationFailed,

    /// The host loop returned a different event type than the one requested.
    #[error("requested event type {requested} unavailable; host returned {returned}")]
    RequestedEventTypeUnavailable {
        /// The event type asked for.
        requested: EventType,
        /// The event type the host actually handed out.
        returned: EventType,
    },

    /// An interactive flow was rejected by the user.
    #[error("user cancelled")]
    UserCancelled,

    /// The runner's overall deadline expired.
    #[error("runner timed out after {timeout:?}")]
    RunnerTimedOut {
        /// The configured runner timeout.
        timeout: Duration,
    },

    /// A nested deadline scope expired (see [`TooSlow`]).
    #[error("deadline of {timeout:?} exceeded")]
    TooSlow {
        /// The deadline of the scope that expired.
        timeout: Duration,
    },

    /// [`Outcomes::unwrap`](crate::Outcomes::unwrap) was called before anything was recorded.
    #[error("no outcomes recorded")]
    NoOutcomes,

    /// An outcome slot was written twice.
    #[error("{slot} outcome already recorded")]
    OutcomeAlreadyRecorded {
        /// `"host"` or `"guest"`.
        slot: &'static str,
    },

    /// The host loop exited with a nonzero status.
    #[error("host loop exited with return code {code}")]
    ReturnCode {
        /// The exit status returned by the host loop.
        code: i32,
    },

    /// The enclosing cancel scope was cancelled before the work finished.
    #[error("cancelled")]
    Cancelled,

    /// The event source went away before it fired.
    #[error("event source closed before emitting")]
    SourceClosed,

    /// A task was started on a nursery that has already been joined.
    #[error("nursery is closed")]
    NurseryClosed,

    /// [`Runner::run`](crate::Runner::run) was called more than once.
    #[error("runner already started")]
    RunnerAlreadyStarted,

    /// Generic failure raised by user code.
    #[error("failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl BridgeError {
    /// Builds a [`BridgeError::Failed`] from any displayable error.
    pub fn failed(error: impl std::fmt::Display) -> Self {
        BridgeError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use loopbridge::BridgeError;
    ///
    /// let err = BridgeError::ReturnCode { code: 3 };
    /// assert_eq!(err.as_label(), "host_return_code");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::EventTypeAlreadyRegistered { .. } => "event_type_already_registered",
            BridgeError::EventTypeRegistrationFailed => "event_type_registration_failed",
            BridgeError::RequestedEventTypeUnavailable { .. } => {
                "requested_event_type_unavailable"
            }
            BridgeError::UserCancelled => "user_cancelled",
            BridgeError::RunnerTimedOut { .. } => "runner_timed_out",
            BridgeError::TooSlow { .. } => "too_slow",
            BridgeError::NoOutcomes => "no_outcomes",
            BridgeError::OutcomeAlreadyRecorded { .. } => "outcome_already_recorded",
            BridgeError::ReturnCode { .. } => "host_return_code",
            BridgeError::Cancelled => "cancelled",
            BridgeError::SourceClosed => "source_closed",
            BridgeError::NurseryClosed => "nursery_closed",
            BridgeError::RunnerAlreadyStarted => "runner_already_started",
            BridgeError::Failed { .. } => "failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BridgeError::EventTypeAlreadyRegistered { event_type } => {
                format!("already registered: {event_type}")
            }
            BridgeError::RequestedEventTypeUnavailable {
                requested,
                returned,
            } => format!("requested={requested} returned={returned}"),
            BridgeError::RunnerTimedOut { timeout } | BridgeError::TooSlow { timeout } => {
                format!("timeout: {timeout:?}")
            }
            BridgeError::OutcomeAlreadyRecorded { slot } => format!("slot: {slot}"),
            BridgeError::ReturnCode { code } => format!("return code: {code}"),
            BridgeError::Failed { error } => format!("error: {error}"),
            other => other.to_string(),
        }
    }

    /// Indicates whether the error reports a cancellation rather than a fault.
    ///
    /// # Example
    /// ```
    /// use loopbridge::BridgeError;
    ///
    /// assert!(BridgeError::UserCancelled.is_cancellation());
    /// assert!(!BridgeError::NoOutcomes.is_cancellation());
    /// ```
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BridgeError::Cancelled | BridgeError::UserCancelled)
    }
}

/// Deadline expiry raised by [`fail_after`](crate::fail_after).
///
/// Kept separate from [`BridgeError`] so a caller can tell its own deadline apart from a
/// [`BridgeError::TooSlow`] bubbling up from a nested scope.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {timeout:?} exceeded")]
pub struct TooSlow {
    /// The deadline of the scope that expired.
    pub timeout: Duration,
}

impl From<TooSlow> for BridgeError {
    fn from(err: TooSlow) -> Self {
        BridgeError::TooSlow {
            timeout: err.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = BridgeError::RunnerTimedOut {
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.as_label(), "runner_timed_out");
        assert_eq!(err.as_message(), "timeout: 1s");
    }

    #[test]
    fn test_too_slow_converts() {
        let err: BridgeError = TooSlow {
            timeout: Duration::from_millis(5),
        }
        .into();
        assert!(
            matches!(err, BridgeError::TooSlow { timeout } if timeout == Duration::from_millis(5))
        );
    }

    #[test]
    fn test_failed_keeps_message() {
        let err = BridgeError::failed("boom");
        assert_eq!(err.to_string(), "failed: boom");
        assert!(!err.is_cancellation());
    }
}
