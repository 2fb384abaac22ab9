//! Test helpers (feature `test-util`).

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::BridgeError;
use crate::guest::{Clock, GuestRunConfig, start_guest_run};
use crate::host::{EventLoop, EventType, HostLoop};
use crate::outcome::Outcome;
use crate::reentry::{self, ReentryTarget};

/// Forgets the process-wide reentry event type so the next run registers again.
///
/// Only meant for test harnesses that run several bridges in one process.
pub fn reset_registration() {
    reentry::reset_registration();
}

/// Runs `fut` as the main task of a guest run on a private [`EventLoop`] and returns its
/// outcome.
///
/// Does not touch the process-wide registration: the private loop answers to
/// [`EventType::USER`].
pub fn block_on_guest<F, T>(clock: Option<Arc<dyn Clock>>, fut: F) -> Outcome<T>
where
    F: Future<Output = Result<T, BridgeError>> + Send + 'static,
    T: Send + 'static,
{
    let host = EventLoop::arc();
    let target = Arc::new(ReentryTarget::new(EventType::USER));
    let slot: Arc<Mutex<Option<Outcome<T>>>> = Arc::new(Mutex::new(None));

    let poster = Arc::clone(&host);
    let finisher = Arc::clone(&host);
    let out = Arc::clone(&slot);
    let mut config = GuestRunConfig::new(
        move |cb| reentry::post(&*poster, &target, cb),
        move |outcome| {
            *out.lock() = Some(outcome);
            finisher.quit();
        },
    );
    config.clock = clock;

    let _handle = start_guest_run(fut, config);
    host.exec();

    let outcome = slot.lock().take();
    outcome.unwrap_or(Outcome::Error(BridgeError::NoOutcomes))
}
