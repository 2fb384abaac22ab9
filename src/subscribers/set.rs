//! # SubscriberSet: inline fan-out over multiple subscribers.
//!
//! ```text
//!    emit(&Event)
//!        ├──► catch_unwind(sub1.on_event) ─► panic → tracing::warn
//!        ├──► catch_unwind(sub2.on_event)
//!        └──► catch_unwind(subN.on_event)
//! ```
//!
//! Delivery is synchronous: the runner publishes from the host thread, which has no
//! executor to run subscriber workers on.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::events::Event;
use crate::outcome::payload_message;

use super::Subscribe;

/// Ordered collection of subscribers.
#[derive(Default)]
pub struct SubscriberSet {
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set delivering to `subs` in the given order.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subscribers: subs }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether the set has no subscriber.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Delivers `event` to every subscriber.
    pub fn emit(&self, event: &Event) {
        for sub in &self.subscribers {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| sub.on_event(event))) {
                tracing::warn!(
                    subscriber = sub.name(),
                    seq = event.seq,
                    info = payload_message(panic.as_ref()).unwrap_or("unknown panic"),
                    "subscriber panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use parking_lot::Mutex;

    struct Recorder(Mutex<Vec<EventKind>>);

    impl Subscribe for Recorder {
        fn on_event(&self, event: &Event) {
            self.0.lock().push(event.kind);
        }
    }

    struct Panicky;

    impl Subscribe for Panicky {
        fn on_event(&self, _event: &Event) {
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        let set = SubscriberSet::new(vec![Arc::new(Panicky) as Arc<dyn Subscribe>, rec.clone()]);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::GuestStarted));
        set.emit(&Event::new(EventKind::GuestFinished));

        assert_eq!(
            *rec.0.lock(),
            vec![EventKind::GuestStarted, EventKind::GuestFinished]
        );
    }
}
