use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, oneshot};

use crate::error::BridgeError;
use crate::host::{Connection, Signal};

/// Waits for the next firing of `signal` and returns its arguments.
///
/// The slot is connected when this future is first polled, so a firing that happens
/// between deciding to wait and that first poll is missed. To wait race-free, create a
/// [`SignalWaiter`] before triggering the action that fires the signal.
///
/// Fails with [`BridgeError::SourceClosed`] if the slot is dropped without firing.
pub async fn wait_signal<A>(signal: &Signal<A>) -> Result<A, BridgeError>
where
    A: Clone + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let connection = signal.connect(move |args| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(args);
        }
    });

    let result = rx.await.map_err(|_| BridgeError::SourceClosed);
    connection.disconnect();
    result
}

/// Subscription that remembers whether its signal fired.
///
/// Connects at construction; [`SignalWaiter::wait`] returns at once if the signal has
/// fired since. Arguments are not kept.
#[derive(Debug)]
pub struct SignalWaiter {
    fired: Arc<Fired>,
    connection: Connection,
}

#[derive(Debug, Default)]
struct Fired {
    flag: AtomicBool,
    notify: Notify,
}

impl SignalWaiter {
    /// Connects to `signal` now.
    pub fn new<A>(signal: &Signal<A>) -> Self
    where
        A: Clone + Send + 'static,
    {
        let fired = Arc::new(Fired::default());
        let slot = Arc::clone(&fired);
        let connection = signal.connect(move |_| {
            slot.flag.store(true, Ordering::Release);
            slot.notify.notify_one();
        });
        Self { fired, connection }
    }

    /// Whether the signal has fired since construction.
    pub fn has_fired(&self) -> bool {
        self.fired.flag.load(Ordering::Acquire)
    }

    /// Waits for the first firing, then disconnects.
    pub async fn wait(self) {
        if !self.has_fired() {
            self.fired.notify.notified().await;
        }
        self.connection.disconnect();
    }
}
