//! # LogWriter: runner events through `tracing`.
//!
//! ## Output (message and fields)
//! ```text
//! [event-type-registered] code=65535
//! [guest-started]
//! [guest-failed] reason="failed: boom"
//! [timeout] timeout_ms=1000
//! [cancel-requested] reason="last window closed"
//! [quit-requested]
//! [host-exited] code=0
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs every event with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Subscribe for LogWriter {
    fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::EventTypeRegistered => {
                tracing::info!(seq = e.seq, code = e.code, "[event-type-registered]");
            }
            EventKind::GuestStarted => {
                tracing::info!(seq = e.seq, "[guest-started]");
            }
            EventKind::GuestFinished => {
                tracing::info!(seq = e.seq, reason, "[guest-finished]");
            }
            EventKind::GuestFailed => {
                tracing::warn!(seq = e.seq, reason, "[guest-failed]");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(seq = e.seq, timeout_ms = e.timeout_ms, "[timeout]");
            }
            EventKind::CancelRequested => {
                tracing::info!(seq = e.seq, reason, "[cancel-requested]");
            }
            EventKind::QuitRequested => {
                tracing::info!(seq = e.seq, "[quit-requested]");
            }
            EventKind::HostExited => {
                tracing::info!(seq = e.seq, code = e.code, "[host-exited]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
