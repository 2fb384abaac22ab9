//! # In-process host loop.
//!
//! [`EventLoop`] is a complete [`HostLoop`] with no toolkit behind it. It backs the
//! tests and demos, and doubles as a reference for what a real host binding has to do.
//!
//! ## Architecture
//! ```text
//! post_event() / exit()  (any thread, non-blocking)
//!        │
//!        ▼
//!  [unbounded mpsc queue] ──► exec() / process_pending()  (host thread)
//!                                 ├─ Post { target, event } ─► target.event(event)
//!                                 └─ Exit(code)             ─► return code
//! ```
//!
//! ## Rules
//! - Messages are handled strictly in posting order.
//! - `exit` is a queued message: events posted before it are dispatched first.
//! - Event types are allocated like common GUI toolkits do: the hint if it is free and in
//!   the user range, otherwise the highest free id counting down from
//!   [`EventType::MAX_USER`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{EventTarget, EventType, HostLoop, PostedEvent, Signal};

enum Message {
    Post {
        target: Arc<dyn EventTarget>,
        event: PostedEvent,
    },
    Exit(i32),
}

/// In-process event loop implementing [`HostLoop`].
pub struct EventLoop {
    tx: mpsc::UnboundedSender<Message>,
    rx: Mutex<mpsc::UnboundedReceiver<Message>>,
    registered: Mutex<BTreeSet<i32>>,
    quit_on_last_window_closed: AtomicBool,
    last_window_closed: Signal<()>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// Creates an idle loop with an empty queue.
    ///
    /// `quit_on_last_window_closed` starts disabled, so a guest run is not cancelled by
    /// window management unless asked for.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            registered: Mutex::new(BTreeSet::new()),
            quit_on_last_window_closed: AtomicBool::new(false),
            last_window_closed: Signal::new("last_window_closed"),
        }
    }

    /// Creates the loop behind an `Arc`, ready to be shared with a runner.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Sets whether closing the last window should cancel the guest run.
    pub fn set_quit_on_last_window_closed(&self, enabled: bool) {
        self.quit_on_last_window_closed
            .store(enabled, Ordering::Release);
    }

    /// Simulates the last window closing by firing the notification.
    pub fn close_last_window(&self) {
        self.last_window_closed.emit(());
    }

    /// Dispatches everything already queued, without blocking.
    ///
    /// Returns the number of events dispatched, or `None` if an exit request was consumed.
    /// Does nothing (returns `Some(0)`) when called while [`exec`](HostLoop::exec) is
    /// running.
    pub fn process_pending(&self) -> Option<usize> {
        let Some(mut rx) = self.rx.try_lock() else {
            return Some(0);
        };

        let mut dispatched = 0;
        while let Ok(message) = rx.try_recv() {
            match message {
                Message::Post { target, event } => {
                    target.event(event);
                    dispatched += 1;
                }
                Message::Exit(code) => {
                    tracing::debug!(code, "exit consumed by process_pending");
                    return None;
                }
            }
        }
        Some(dispatched)
    }
}

impl HostLoop for EventLoop {
    fn register_event_type(&self, hint: Option<EventType>) -> Option<EventType> {
        let mut registered = self.registered.lock();

        if let Some(hint) = hint.filter(|h| h.is_user()) {
            if registered.insert(hint.get()) {
                return Some(hint);
            }
        }

        let free = (EventType::USER.get()..=EventType::MAX_USER.get())
            .rev()
            .find(|id| !registered.contains(id))?;
        registered.insert(free);
        Some(EventType::new(free))
    }

    fn post_event(&self, target: Arc<dyn EventTarget>, event: PostedEvent) {
        if self.tx.send(Message::Post { target, event }).is_err() {
            tracing::warn!("event posted to a closed host loop");
        }
    }

    fn exec(&self) -> i32 {
        let mut rx = self.rx.lock();
        tracing::debug!("host loop started");

        while let Some(message) = rx.blocking_recv() {
            match message {
                Message::Post { target, event } => {
                    target.event(event);
                }
                Message::Exit(code) => {
                    tracing::debug!(code, "host loop exiting");
                    return code;
                }
            }
        }
        0
    }

    fn exit(&self, code: i32) {
        let _ = self.tx.send(Message::Exit(code));
    }

    fn quit_on_last_window_closed(&self) -> bool {
        self.quit_on_last_window_closed.load(Ordering::Acquire)
    }

    fn last_window_closed(&self) -> Option<Signal<()>> {
        Some(self.last_window_closed.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct Recorder(Mutex<Vec<u32>>);

    impl EventTarget for Recorder {
        fn event(&self, event: PostedEvent) -> bool {
            if let Ok(v) = event.into_payload::<u32>() {
                self.0.lock().push(v);
            }
            false
        }
    }

    #[test]
    fn test_allocates_from_the_top() {
        let host = EventLoop::new();
        assert_eq!(host.register_event_type(None), Some(EventType::MAX_USER));
        assert_eq!(
            host.register_event_type(None),
            Some(EventType::new(EventType::MAX_USER.get() - 1))
        );
    }

    #[test]
    fn test_hint_honoured_when_free() {
        let host = EventLoop::new();
        let hint = EventType::new(2000);
        assert_eq!(host.register_event_type(Some(hint)), Some(hint));
        // taken now: falls back to the top of the range
        assert_eq!(host.register_event_type(Some(hint)), Some(EventType::MAX_USER));
        // out of range hints are ignored
        assert_eq!(
            host.register_event_type(Some(EventType::new(5))),
            Some(EventType::new(EventType::MAX_USER.get() - 1))
        );
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let host = EventLoop::new();
        host.registered
            .lock()
            .extend(EventType::USER.get() + 1..=EventType::MAX_USER.get());

        assert_eq!(host.register_event_type(None), Some(EventType::USER));
        assert_eq!(host.register_event_type(None), None);
        assert_eq!(host.register_event_type(Some(EventType::USER)), None);
    }

    #[test]
    fn test_dispatch_in_order_then_exit_code() {
        let host = EventLoop::new();
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        for v in 0..5u32 {
            host.post_event(rec.clone(), PostedEvent::new(EventType::USER, v));
        }
        host.exit(3);
        host.post_event(rec.clone(), PostedEvent::new(EventType::USER, 99u32));

        assert_eq!(host.exec(), 3);
        assert_eq!(*rec.0.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_post_from_other_thread() {
        let host = EventLoop::arc();
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));

        let h = Arc::clone(&host);
        let r = Arc::clone(&rec);
        let poster = thread::spawn(move || {
            for v in 0..100u32 {
                h.post_event(r.clone(), PostedEvent::new(EventType::USER, v));
            }
            h.exit(0);
        });

        assert_eq!(host.exec(), 0);
        poster.join().expect("poster thread");
        assert_eq!(*rec.0.lock(), (0..100).collect::<Vec<u32>>());
    }

    #[test]
    fn test_process_pending_stops_at_exit() {
        let host = EventLoop::new();
        let rec = Arc::new(Recorder(Mutex::new(Vec::new())));
        host.post_event(rec.clone(), PostedEvent::new(EventType::USER, 1u32));
        assert_eq!(host.process_pending(), Some(1));
        host.exit(0);
        assert_eq!(host.process_pending(), None);
    }
}
