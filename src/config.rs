//! # Runner configuration.
//!
//! [`RunnerConfig`] defines what the [`Runner`](crate::Runner) does around the guest run:
//! whether it drives the host loop, whether it stops the host when the guest finishes,
//! and an optional overall deadline.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no timeout
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use loopbridge::RunnerConfig;
//!
//! let mut cfg = RunnerConfig::default();
//! cfg.timeout = Duration::from_secs(30);
//! cfg.quit_application = false;
//!
//! assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
//! ```

use std::time::Duration;

/// Configuration of one [`Runner`](crate::Runner).
///
/// ## Field semantics
/// - `quit_application`: ask the host loop to quit once the guest finishes
/// - `timeout`: overall guest deadline (`0s` = none)
/// - `execute_application`: run the host loop's blocking `exec` inside `run`
///
/// ## Notes
/// All fields are public for flexibility. Prefer the [`timeout`](Self::timeout) accessor
/// to avoid sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Ask the host loop to quit once the guest run finished.
    pub quit_application: bool,

    /// Overall deadline for the guest's main task.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = the main task fails with `RunnerTimedOut` once it elapses
    pub timeout: Duration,

    /// Run the host loop inside [`Runner::run`](crate::Runner::run).
    ///
    /// Disable when the host loop is already running (embedding, tests); `run` then
    /// returns right after starting the guest with empty outcomes.
    pub execute_application: bool,
}

impl RunnerConfig {
    /// Returns the overall timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → deadline applied to the main task
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }
}

impl Default for RunnerConfig {
    /// Default configuration:
    ///
    /// - `quit_application = true`
    /// - `timeout = 0s` (no timeout)
    /// - `execute_application = true`
    fn default() -> Self {
        Self {
            quit_application: true,
            timeout: Duration::ZERO,
            execute_application: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_is_none() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.timeout(), None);
        assert!(cfg.quit_application);
        assert!(cfg.execute_application);
    }
}
