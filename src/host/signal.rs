//! # Push-style event sources.
//!
//! A [`Signal`] is a host-side notification with an argument type `A`. Slots are
//! connected with [`Signal::connect`] and invoked synchronously, in connection order, by
//! [`Signal::emit`] on the emitting thread (the host thread in practice).
//!
//! ## Rules
//! - Every signal gets a [`SourceId`] at creation. Clones of a handle share it, so
//!   identity checks compare ids, never argument values.
//! - [`Connection`] disconnects its slot on drop; [`ConnectionStack`] releases many
//!   connections in reverse acquisition order.
//! - Slots run without the slot list locked: a slot may connect, disconnect or emit.
//! - A slot connected during an emission is first called by the next emission.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// Global counter for source identities.
static SOURCE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a [`Signal`], shared by all clones of its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    fn next() -> Self {
        Self(SOURCE_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

type Slot<A> = Arc<dyn Fn(A) + Send + Sync + 'static>;

struct SignalInner<A> {
    id: SourceId,
    name: Cow<'static, str>,
    slots: Mutex<Vec<(u64, Slot<A>)>>,
    next_slot: AtomicU64,
}

/// Host-side event source delivering `A` to connected slots.
pub struct Signal<A> {
    inner: Arc<SignalInner<A>>,
}

impl<A> Clone for Signal<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("slots", &self.inner.slots.lock().len())
            .finish()
    }
}

impl<A: Clone + Send + 'static> Signal<A> {
    /// Creates a signal with a fresh identity.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: SourceId::next(),
                name: name.into(),
                slots: Mutex::new(Vec::new()),
                next_slot: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the stable identity of this source.
    #[inline]
    pub fn id(&self) -> SourceId {
        self.inner.id
    }

    /// Returns the human-readable name given at creation.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Number of currently connected slots.
    pub fn connection_count(&self) -> usize {
        self.inner.slots.lock().len()
    }

    /// Connects `slot`; it stays connected until the returned [`Connection`] is dropped.
    #[must_use = "dropping the Connection disconnects the slot"]
    pub fn connect<F>(&self, slot: F) -> Connection
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        let key = self.inner.next_slot.fetch_add(1, Ordering::Relaxed);
        self.inner.slots.lock().push((key, Arc::new(slot)));

        let weak: Weak<SignalInner<A>> = Arc::downgrade(&self.inner);
        Connection {
            source: self.inner.id,
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.slots.lock().retain(|(k, _)| *k != key);
                }
            })),
        }
    }

    /// Delivers `args` to every connected slot, in connection order.
    pub fn emit(&self, args: A) {
        let slots: Vec<Slot<A>> = self
            .inner
            .slots
            .lock()
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();

        for slot in slots {
            slot(args.clone());
        }
    }
}

/// Live subscription of one slot; disconnects on drop.
#[must_use = "dropping the Connection disconnects the slot"]
pub struct Connection {
    source: SourceId,
    release: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl Connection {
    /// Identity of the source this connection listens to.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Disconnects now.
    pub fn disconnect(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("source", &self.source)
            .field("connected", &self.release.is_some())
            .finish()
    }
}

/// Exit stack of connections, released in reverse acquisition order.
#[derive(Debug, Default)]
pub struct ConnectionStack {
    connections: Vec<Connection>,
}

impl ConnectionStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a connection onto the stack.
    pub fn push(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the stack holds no connection.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Releases every connection, most recent first.
    pub fn close(&mut self) {
        while let Some(connection) = self.connections.pop() {
            connection.disconnect();
        }
    }
}

impl Drop for ConnectionStack {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_connection_order() {
        let sig = Signal::<u32>::new("value");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        let _c1 = sig.connect(move |v| s1.lock().push(("first", v)));
        let s2 = Arc::clone(&seen);
        let _c2 = sig.connect(move |v| s2.lock().push(("second", v)));

        sig.emit(1);
        sig.emit(2);

        assert_eq!(
            *seen.lock(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)]
        );
    }

    #[test]
    fn test_drop_disconnects() {
        let sig = Signal::<()>::new("clicked");
        let conn = sig.connect(|()| {});
        assert_eq!(sig.connection_count(), 1);
        drop(conn);
        assert_eq!(sig.connection_count(), 0);
    }

    #[test]
    fn test_clones_share_identity() {
        let a = Signal::<()>::new("a");
        let b = Signal::<()>::new("b");
        assert_eq!(a.id(), a.clone().id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_stack_releases_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut stack = ConnectionStack::new();

        for name in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            stack.push(Connection {
                source: SourceId::next(),
                release: Some(Box::new(move || order.lock().push(name))),
            });
        }
        assert_eq!(stack.len(), 3);
        stack.close();
        assert!(stack.is_empty());
        assert_eq!(*order.lock(), vec!["third", "second", "first"]);
    }

    #[test]
    fn test_slot_may_disconnect_itself() {
        let sig = Signal::<u8>::new("once");
        let holder: Arc<Mutex<Option<Connection>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicU64::new(0));

        let h = Arc::clone(&holder);
        let n = Arc::clone(&hits);
        let conn = sig.connect(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
            h.lock().take();
        });
        *holder.lock() = Some(conn);

        sig.emit(1);
        sig.emit(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(sig.connection_count(), 0);
    }
}
