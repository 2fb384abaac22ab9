//! Runner events: the lifecycle data model.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publisher**: [`Runner`](crate::Runner), on the host thread; only
//!   [`Runner::cancel`](crate::Runner::cancel) publishes from the caller's thread.
//! - **Consumers**: [`Subscribe`](crate::Subscribe) implementations, fed inline by
//!   [`SubscriberSet`](crate::SubscriberSet).

mod event;

pub use event::{Event, EventKind};
