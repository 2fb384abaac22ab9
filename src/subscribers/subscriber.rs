//! # Event subscriber trait.
//!
//! Provides [`Subscribe`], an extension point for plugging custom event handlers into
//! the runner.
//!
//! ## Rules
//! - Events are delivered inline, in publication order, on the publishing thread (the
//!   host thread, except for `Runner::cancel`).
//! - A subscriber must return quickly: it runs between two host events.
//! - Panics are caught and logged; other subscribers still receive the event.
//!
//! ## Example
//! ```rust
//! use loopbridge::{Event, EventKind, Subscribe};
//!
//! struct Failures;
//!
//! impl Subscribe for Failures {
//!     fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::GuestFailed) {
//!             // raise an alert, bump a counter, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failures" }
//! }
//! ```

use crate::events::Event;

/// Runner event subscriber.
///
/// ### Implementation requirements
/// - Do not block; hand slow work off to another thread.
/// - Handle errors internally; do not panic.
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event.
    fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when
    /// possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
