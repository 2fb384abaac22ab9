//! Lifecycle state of a [`Runner`](crate::Runner).
//!
//! ```text
//! Idle ──► Registered ──► Running ──► GuestDone ──► HostDone ──► Finalized
//!                            │                         ▲
//!                            └── host exits first ─────┘
//! ```

use std::fmt;

/// Where a runner is in its single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    /// Built, `run` not called yet.
    Idle,
    /// Reentry event type resolved.
    Registered,
    /// Guest started; neither side finished.
    Running,
    /// Guest outcome recorded.
    GuestDone,
    /// Host outcome recorded.
    HostDone,
    /// Outcomes handed back to the caller.
    Finalized,
}

impl RunnerState {
    /// Whether `run` has been called.
    #[inline]
    pub fn is_started(self) -> bool {
        !matches!(self, RunnerState::Idle)
    }

    /// Returns a short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            RunnerState::Idle => "idle",
            RunnerState::Registered => "registered",
            RunnerState::Running => "running",
            RunnerState::GuestDone => "guest_done",
            RunnerState::HostDone => "host_done",
            RunnerState::Finalized => "finalized",
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
