//! # Event subscribers for the runner.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Runner ── emit(&Event) ──► SubscriberSet ──┬──► LogWriter
//!   (host thread, inline)                    ├──► Metrics
//!                                            └──► Custom ...
//! ```

mod log;
mod set;
mod subscriber;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
