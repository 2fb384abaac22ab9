//! # Outcome unifier.
//!
//! An [`Outcome`] captures how one execution model finished: a value, a clean
//! cancellation, an error, or a panic payload. [`Outcomes`] holds one slot for the host
//! loop and one for the guest run and resolves them into a single result.
//!
//! ## Resolution order of [`Outcomes::unwrap`]
//! ```text
//! guest set?
//!   ├─ yes ─► guest failed?  ─► raise guest failure (host is not consulted)
//!   │         guest ok       ─► host set and failed? ─► raise host failure
//!   │                                                  ├─► cancelled? Resolved::Cancelled
//!   │                                                  └─► return guest value
//!   └─ no ──► host set?      ─► resolve host
//!             neither        ─► NoOutcomes
//! ```
//!
//! "Raise" means `Err(BridgeError)` for errors and [`resume_unwind`] for captured
//! panics, so a failed assertion inside the guest surfaces as that same panic.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, resume_unwind};

use futures::FutureExt;

use crate::error::BridgeError;

/// Captured result of one execution model.
pub enum Outcome<T> {
    /// Finished with a value.
    Value(T),
    /// Stopped by its cancel scope without failing.
    Cancelled,
    /// Finished with an error.
    Error(BridgeError),
    /// Panicked; holds the panic payload.
    Panic(Box<dyn Any + Send + 'static>),
}

impl<T> Outcome<T> {
    /// Awaits `fut`, capturing its result or panic.
    pub async fn capture<F>(fut: F) -> Outcome<T>
    where
        F: Future<Output = Result<T, BridgeError>>,
    {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(value)) => Outcome::Value(value),
            Ok(Err(err)) => Outcome::Error(err),
            Err(payload) => Outcome::Panic(payload),
        }
    }

    /// Whether this outcome is a value.
    pub fn is_value(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    /// Whether this outcome is a clean cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Whether this outcome is an error or a panic.
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Error(_) | Outcome::Panic(_))
    }

    /// Returns the error, if this outcome is one.
    pub fn error(&self) -> Option<&BridgeError> {
        match self {
            Outcome::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the panic message, if this outcome is a panic with a string payload.
    pub fn panic_message(&self) -> Option<&str> {
        match self {
            Outcome::Panic(payload) => payload_message(payload.as_ref()),
            _ => None,
        }
    }

    /// Returns the value or error; resumes a captured panic.
    ///
    /// A clean cancellation has no value and comes back as [`BridgeError::Cancelled`];
    /// [`Outcomes::unwrap`] resolves it to [`Resolved::Cancelled`] instead.
    pub fn unwrap(self) -> Result<T, BridgeError> {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::Cancelled => Err(BridgeError::Cancelled),
            Outcome::Error(err) => Err(err),
            Outcome::Panic(payload) => resume_unwind(payload),
        }
    }
}

impl Outcome<i32> {
    /// Converts a host loop exit status: `0` is a value, anything else a
    /// [`BridgeError::ReturnCode`].
    pub fn from_return_code(code: i32) -> Self {
        if code == 0 {
            Outcome::Value(code)
        } else {
            Outcome::Error(BridgeError::ReturnCode { code })
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Outcome::Cancelled => f.write_str("Cancelled"),
            Outcome::Error(err) => f.debug_tuple("Error").field(err).finish(),
            Outcome::Panic(payload) => f
                .debug_tuple("Panic")
                .field(&payload_message(payload.as_ref()).unwrap_or("<non-string payload>"))
                .finish(),
        }
    }
}

/// Extracts the message of a `&'static str` or `String` panic payload.
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        Some(msg)
    } else {
        payload.downcast_ref::<String>().map(String::as_str)
    }
}

/// Value picked by [`Outcomes::unwrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The guest run's value.
    Guest(T),
    /// The guest run was cancelled cleanly (runner cancel or last window closed).
    Cancelled,
    /// The host loop's exit status (only when no guest outcome was recorded).
    Host(i32),
}

/// Outcomes of the host loop and the guest run, each recorded at most once.
pub struct Outcomes<T> {
    host: Option<Outcome<i32>>,
    guest: Option<Outcome<T>>,
}

impl<T> Default for Outcomes<T> {
    fn default() -> Self {
        Self {
            host: None,
            guest: None,
        }
    }
}

impl<T> Outcomes<T> {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// The host loop outcome, if recorded.
    pub fn host(&self) -> Option<&Outcome<i32>> {
        self.host.as_ref()
    }

    /// The guest run outcome, if recorded.
    pub fn guest(&self) -> Option<&Outcome<T>> {
        self.guest.as_ref()
    }

    /// Whether neither slot has been recorded.
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.guest.is_none()
    }

    /// Records the host loop outcome.
    pub fn record_host(&mut self, outcome: Outcome<i32>) -> Result<(), BridgeError> {
        if self.host.is_some() {
            return Err(BridgeError::OutcomeAlreadyRecorded { slot: "host" });
        }
        self.host = Some(outcome);
        Ok(())
    }

    /// Records the guest run outcome.
    pub fn record_guest(&mut self, outcome: Outcome<T>) -> Result<(), BridgeError> {
        if self.guest.is_some() {
            return Err(BridgeError::OutcomeAlreadyRecorded { slot: "guest" });
        }
        self.guest = Some(outcome);
        Ok(())
    }

    /// Resolves both slots into one result; see the module docs for the order.
    pub fn unwrap(self) -> Result<Resolved<T>, BridgeError> {
        match (self.guest, self.host) {
            (Some(Outcome::Cancelled), host) => {
                if let Some(host) = host {
                    host.unwrap()?;
                }
                Ok(Resolved::Cancelled)
            }
            (Some(guest), host) => {
                let value = guest.unwrap()?;
                if let Some(host) = host {
                    host.unwrap()?;
                }
                Ok(Resolved::Guest(value))
            }
            (None, Some(host)) => host.unwrap().map(Resolved::Host),
            (None, None) => Err(BridgeError::NoOutcomes),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcomes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcomes")
            .field("host", &self.host)
            .field("guest", &self.guest)
            .finish()
    }
}
