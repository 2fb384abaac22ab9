//! Time sources for the guest scheduler.
//!
//! Guest time is a [`Duration`] since the clock was started. The scheduler asks the clock
//! how long to sleep before the earliest pending deadline; a zero answer means "tick now".

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Time source driving guest deadlines.
pub trait Clock: Send + Sync + 'static {
    /// Called once when a guest run starts.
    fn start_clock(&self) {}

    /// Current guest time.
    fn current_time(&self) -> Duration;

    /// Real time to wait until `deadline` is reached.
    ///
    /// [`Duration::MAX`] means "never by itself" (the clock must be advanced externally).
    fn deadline_to_sleep_time(&self, deadline: Duration) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Default)]
pub struct SystemClock {
    origin: Mutex<Option<Instant>>,
}

impl SystemClock {
    /// Creates a clock; time starts at the first [`Clock::start_clock`] or reading.
    pub fn new() -> Self {
        Self::default()
    }

    fn origin(&self) -> Instant {
        *self.origin.lock().get_or_insert_with(Instant::now)
    }
}

impl Clock for SystemClock {
    fn start_clock(&self) {
        self.origin();
    }

    fn current_time(&self) -> Duration {
        self.origin().elapsed()
    }

    fn deadline_to_sleep_time(&self, deadline: Duration) -> Duration {
        deadline.saturating_sub(self.current_time())
    }
}

struct MockState {
    now: Duration,
    autojump: bool,
}

/// Virtual clock for deterministic tests.
///
/// In autojump mode, whenever the scheduler would sleep, time jumps straight to the next
/// deadline. In manual mode time only moves through [`MockClock::jump`].
pub struct MockClock {
    state: Mutex<MockState>,
}

impl MockClock {
    /// Manual clock starting at zero.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                now: Duration::ZERO,
                autojump: false,
            }),
        }
    }

    /// Clock that skips idle periods.
    pub fn autojump() -> Self {
        let clock = Self::new();
        clock.set_autojump(true);
        clock
    }

    /// Enables or disables autojump.
    pub fn set_autojump(&self, enabled: bool) {
        self.state.lock().autojump = enabled;
    }

    /// Advances time by `by`.
    pub fn jump(&self, by: Duration) {
        let mut state = self.state.lock();
        state.now = state.now.saturating_add(by);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockClock")
            .field("now", &state.now)
            .field("autojump", &state.autojump)
            .finish()
    }
}

impl Clock for MockClock {
    fn current_time(&self) -> Duration {
        self.state.lock().now
    }

    fn deadline_to_sleep_time(&self, deadline: Duration) -> Duration {
        let mut state = self.state.lock();
        if deadline <= state.now {
            return Duration::ZERO;
        }
        if state.autojump {
            state.now = deadline;
            Duration::ZERO
        } else {
            Duration::MAX
        }
    }
}
