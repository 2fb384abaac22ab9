//! Guest scheduler: cooperative tasks that run inside the host loop's thread.
//!
//! The scheduler never blocks and owns no thread of its own (apart from a timer thread
//! that only posts wake requests). It is driven entirely through the reentry hook given
//! to [`start_guest_run`].
//!
//! ## Contents
//! - [`start_guest_run`], [`GuestRunConfig`], [`Handle`], [`spawn`], [`JoinHandle`],
//!   [`yield_now`] the executor
//! - [`Clock`], [`SystemClock`], [`MockClock`] time sources
//! - [`sleep`], [`sleep_until`], [`fail_after`], [`move_on_after`] guest time
//! - [`CancelScope`], [`Nursery`], [`open_nursery`] structured concurrency
//!
//! ```text
//! start_guest_run(main) ──► Handle
//!        │
//!        └─► main task ──► spawn()/open_nursery() ──► child tasks
//!                 │                                        │
//!                 └──── sleeps / scopes / channels ◄───────┘
//!                                 │
//!                 wakers ──► reentry hook ──► host thread tick
//! ```
//!
//! Tokio and `tokio-util` synchronization primitives (`mpsc`, `oneshot`, `Notify`,
//! `CancellationToken`, `TaskTracker`) work inside guest tasks; tokio timers and IO do
//! not, since no tokio runtime is running.

mod clock;
mod nursery;
mod scheduler;
mod scope;
mod time;

pub use clock::{Clock, MockClock, SystemClock};
pub use nursery::{Nursery, open_nursery};
pub use scheduler::{
    GuestRunConfig, Handle, JoinError, JoinHandle, Reentry, spawn, start_guest_run, yield_now,
};
pub use scope::CancelScope;
pub use time::{Sleep, fail_after, move_on_after, sleep, sleep_until};
