//! # loopbridge
//!
//! **Loopbridge** runs a cooperative async scheduler as a *guest* inside a foreign,
//! event-driven *host* loop (a GUI toolkit's main loop, a game loop, an embedded
//! dispatcher) that owns the main thread.
//!
//! Guest code is written with structured concurrency (nurseries, cancel scopes,
//! deadlines) and can consume the host's push-style notifications as pull-style async
//! streams. The guest never blocks the host: it only runs when the host delivers one of
//! its reentry events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                         ┌──────────────────────────────┐
//!   any thread ─ wake ──► │ reentry::post(host, target)  │
//!                         └──────────────┬───────────────┘
//!                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  HostLoop (owns the main thread)                                  │
//! │  - exec() dispatches PostedEvents in posting order                │
//! │  - Signals (clicks, text edits, window closed) fire synchronously │
//! └──────┬──────────────────────────────────────────────┬─────────────┘
//!        │ ReentryTarget::event(WakeRequest)            │ Signal::emit
//!        ▼                                              ▼
//! ┌──────────────────────────────┐        ┌───────────────────────────┐
//! │  Guest scheduler tick        │        │  Emissions adapters       │
//! │  - fire expired timers       │◄─wake──│  - Emissions stream       │
//! │  - poll ready tasks once     │        │  - wait_signal            │
//! │  - request tick / arm timer  │        │  - EmissionsNursery       │
//! └──────┬───────────────────────┘        └───────────────────────────┘
//!        │ main task finished
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner                                                           │
//! │  - records guest and host outcomes (Outcomes)                     │
//! │  - done callback, then host.quit()                                │
//! │  - publishes Events ──► SubscriberSet ──► LogWriter / custom      │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Runner::run(main)
//!   ├─► resolve reentry event type (once per process)
//!   ├─► start_guest_run(main)            first tick posted, not run
//!   ├─► host.exec()                      blocks; ticks run as host events
//!   │      └─ main finished ─► done(outcome) ─► done_callback ─► host.quit()
//!   └─► Outcomes{ guest, host }          unwrap(): guest result wins unless the
//!                                        host exited with an error
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / functions                         |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------------|
//! | **Runner**        | Drive a guest run inside a host loop, collect outcomes.       | [`Runner`], [`run`], [`Outcomes`]             |
//! | **Reentry**       | Thread-safe "run this on the host thread" primitive.          | [`register_event_type`], [`ReentryTarget`]    |
//! | **Guest**         | Scheduler, clocks, deadlines, structured concurrency.         | [`open_nursery`], [`CancelScope`], [`sleep`]  |
//! | **Emissions**     | Host signals as async streams, one-shot waits, handlers.      | [`open_emissions`], [`wait_signal`]           |
//! | **Subscriber API**| Hook into runner lifecycle events.                            | [`Subscribe`], [`LogWriter`]                  |
//! | **Errors**        | Typed errors for registration, runs and guest primitives.     | [`BridgeError`], [`TooSlow`]                  |
//! | **Configuration** | Runner settings.                                              | [`RunnerConfig`]                              |
//!
//! ## Optional features
//! - `test-util`: exposes the [`testing`] helpers (registration reset, private host run).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use loopbridge::{
//!     BridgeError, Capacity, EventLoop, LogWriter, Resolved, Runner, Signal, Subscribe,
//!     open_emissions,
//! };
//!
//! let host = EventLoop::arc();
//! let clicked: Signal<u32> = Signal::new("clicked");
//!
//! let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//! let runner = Runner::builder(host).with_subscribers(subs).build();
//!
//! let source = clicked.clone();
//! let outcomes = runner
//!     .run(async move {
//!         let mut emissions = open_emissions(&[source.clone()], Capacity::Unbounded);
//!         // Emulate the user clicking twice.
//!         source.emit(1);
//!         source.emit(2);
//!
//!         let mut total = 0;
//!         for _ in 0..2 {
//!             if let Some(emission) = emissions.recv().await {
//!                 total += emission.args();
//!             }
//!         }
//!         loopbridge::sleep(Duration::from_millis(1)).await;
//!         Ok::<_, BridgeError>(total)
//!     })
//!     .unwrap();
//!
//! assert!(matches!(outcomes.unwrap(), Ok(Resolved::Guest(3))));
//! ```

mod config;
mod emissions;
mod error;
mod events;
mod guest;
mod host;
mod outcome;
mod reentry;
mod runner;
mod subscribers;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// ---- Public re-exports ----

pub use config::RunnerConfig;
pub use emissions::{
    Capacity, Emission, EmissionStream, Emissions, EmissionsNursery, NurseryOptions,
    ReportErrors, SignalWaiter, SlotFuture, SlotWrapper, enter_emissions, open_emissions,
    open_emissions_nursery, wait_signal,
};
pub use error::{BridgeError, TooSlow};
pub use events::{Event, EventKind};
pub use guest::{
    CancelScope, Clock, GuestRunConfig, Handle, JoinError, JoinHandle, MockClock, Nursery,
    Reentry, Sleep, SystemClock, fail_after, move_on_after, open_nursery, sleep, sleep_until,
    spawn, start_guest_run, yield_now,
};
pub use host::{
    Connection, ConnectionStack, EventLoop, EventTarget, EventType, HostLoop, PostedEvent,
    Signal, SourceId,
};
pub use outcome::{Outcome, Outcomes, Resolved};
pub use reentry::{
    Callback, ReentryTarget, WakeRequest, post, register_event_type,
    register_requested_event_type, registered_event_type,
};
pub use runner::{DoneCallback, Runner, RunnerBuilder, RunnerState, run};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
