//! Emission adapters: consuming host signals from guest code.
//!
//! ## Contents
//! - [`Emission`], [`Capacity`] captured firings and buffer policy
//! - [`open_emissions`], [`enter_emissions`], [`Emissions`], [`EmissionStream`]
//!   push-to-pull streams with fan-in from several signals
//! - [`wait_signal`], [`SignalWaiter`] one-shot waits
//! - [`open_emissions_nursery`], [`EmissionsNursery`], [`NurseryOptions`],
//!   [`SlotWrapper`], [`ReportErrors`] signal handlers as supervised tasks

mod emission;
mod nursery;
mod stream;
mod wait;

pub use emission::{Capacity, Emission};
pub use nursery::{
    EmissionsNursery, NurseryOptions, ReportErrors, SlotFuture, SlotWrapper,
    open_emissions_nursery,
};
pub use stream::{EmissionStream, Emissions, enter_emissions, open_emissions};
pub use wait::{SignalWaiter, wait_signal};
