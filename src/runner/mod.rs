//! # Runner: drives a guest run inside a host loop.
//!
//! - [`Runner`] one run of a main task, with outcomes from both sides
//! - [`RunnerBuilder`] configuration, clock, done callback and subscribers
//! - [`RunnerState`] lifecycle of a runner
//! - [`run`] one-call convenience over the builder
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use loopbridge::{EventLoop, Resolved, Runner, sleep};
//!
//! let host = EventLoop::arc();
//! let runner = Runner::builder(host).build();
//!
//! let outcomes = runner
//!     .run(async {
//!         sleep(Duration::from_millis(1)).await;
//!         Ok::<_, loopbridge::BridgeError>(42)
//!     })
//!     .unwrap();
//!
//! assert!(matches!(outcomes.unwrap(), Ok(Resolved::Guest(42))));
//! ```

mod bridge;
mod builder;
mod main_task;
mod state;

use std::future::Future;
use std::sync::Arc;

pub use bridge::{DoneCallback, Runner};
pub use builder::RunnerBuilder;
pub use state::RunnerState;

use crate::error::BridgeError;
use crate::host::HostLoop;
use crate::outcome::Outcomes;

/// Runs `main` in a guest run on `host` with the default configuration, driving the
/// host loop until it exits.
///
/// # Errors
/// Fails only when the reentry event type cannot be resolved; failures of `main` are
/// recorded in the returned [`Outcomes`].
pub fn run<F, T>(host: Arc<dyn HostLoop>, main: F) -> Result<Outcomes<T>, BridgeError>
where
    F: Future<Output = Result<T, BridgeError>> + Send + 'static,
    T: Send + 'static,
{
    Runner::builder(host).build().run(main)
}
