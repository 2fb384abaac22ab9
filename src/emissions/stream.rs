//! # Push-to-pull adapter: signal firings into an async stream.
//!
//! ```text
//! Signal A ──slot──┐
//! Signal B ──slot──┼──► Producer::send ──try_send──► [mpsc] ──► EmissionStream::recv
//! Signal C ──slot──┘         │
//!                            └─ full: drop + count (never blocks the host thread)
//! ```
//!
//! ## Rules
//! - Slots run on the host thread and return immediately.
//! - Closing the producer is the only end-of-stream signal; queued emissions are still
//!   delivered after it.
//! - Closing is idempotent.
//! - Dropping [`Emissions`] releases the subscriptions (most recent first), then closes
//!   the producer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::emission::{Capacity, Emission};
use crate::host::{ConnectionStack, Signal};

enum Tx<A> {
    Unbounded(mpsc::UnboundedSender<Emission<A>>),
    Bounded(mpsc::Sender<Emission<A>>),
}

enum Rx<A> {
    Unbounded(mpsc::UnboundedReceiver<Emission<A>>),
    Bounded(mpsc::Receiver<Emission<A>>),
}

fn channel<A>(capacity: Capacity) -> (Tx<A>, Rx<A>) {
    match capacity.limit() {
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (Tx::Unbounded(tx), Rx::Unbounded(rx))
        }
        Some(limit) => {
            let (tx, rx) = mpsc::channel(limit);
            (Tx::Bounded(tx), Rx::Bounded(rx))
        }
    }
}

/// Sending side shared by every slot of one stream.
struct Producer<A> {
    tx: Mutex<Option<Tx<A>>>,
    dropped: AtomicU64,
}

impl<A> Producer<A> {
    fn send(&self, emission: Emission<A>) {
        let tx = self.tx.lock();
        let delivered = match tx.as_ref() {
            None => false,
            Some(Tx::Unbounded(tx)) => tx.send(emission).is_ok(),
            Some(Tx::Bounded(tx)) => match tx.try_send(emission) {
                Ok(()) => true,
                Err(TrySendError::Full(emission)) => {
                    let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(
                        source = emission.source().get(),
                        dropped,
                        "emission stream full; emission dropped"
                    );
                    return;
                }
                Err(TrySendError::Closed(_)) => false,
            },
        };
        if !delivered {
            tracing::trace!("emission after stream close ignored");
        }
    }

    fn close(&self) {
        self.tx.lock().take();
    }

    fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Closes the producer when dropped.
struct ProducerGuard<A>(Arc<Producer<A>>);

impl<A> Drop for ProducerGuard<A> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Receiving side of an emission stream.
pub struct EmissionStream<A> {
    rx: Rx<A>,
}

impl<A> EmissionStream<A> {
    /// Receives the next emission; `None` once the producer is closed and drained.
    pub async fn recv(&mut self) -> Option<Emission<A>> {
        std::future::poll_fn(|cx| self.poll_recv(cx)).await
    }

    /// Receives an already queued emission without waiting.
    pub fn try_recv(&mut self) -> Option<Emission<A>> {
        match &mut self.rx {
            Rx::Unbounded(rx) => rx.try_recv().ok(),
            Rx::Bounded(rx) => rx.try_recv().ok(),
        }
    }

    /// Closes the receiving side; queued emissions can still be drained.
    pub fn close(&mut self) {
        match &mut self.rx {
            Rx::Unbounded(rx) => rx.close(),
            Rx::Bounded(rx) => rx.close(),
        }
    }

    /// Number of queued emissions.
    pub fn len(&self) -> usize {
        match &self.rx {
            Rx::Unbounded(rx) => rx.len(),
            Rx::Bounded(rx) => rx.len(),
        }
    }

    /// Whether no emission is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Emission<A>>> {
        match &mut self.rx {
            Rx::Unbounded(rx) => rx.poll_recv(cx),
            Rx::Bounded(rx) => rx.poll_recv(cx),
        }
    }
}

impl<A> Stream for EmissionStream<A> {
    type Item = Emission<A>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_recv(cx)
    }
}

/// Live subscription of several signals feeding one [`EmissionStream`].
///
/// Field order is drop order: subscriptions, then producer, then stream.
pub struct Emissions<A> {
    connections: ConnectionStack,
    producer: ProducerGuard<A>,
    stream: EmissionStream<A>,
}

impl<A> Emissions<A> {
    /// The receiving side.
    pub fn stream_mut(&mut self) -> &mut EmissionStream<A> {
        &mut self.stream
    }

    /// Shortcut for `stream_mut().recv()`.
    pub async fn recv(&mut self) -> Option<Emission<A>> {
        self.stream.recv().await
    }

    /// Stops accepting emissions. Idempotent.
    pub fn close_producer(&self) {
        self.producer.0.close();
    }

    /// Whether the producer side is closed.
    pub fn is_producer_closed(&self) -> bool {
        self.producer.0.is_closed()
    }

    /// Number of emissions dropped because the stream was full.
    pub fn dropped(&self) -> u64 {
        self.producer.0.dropped.load(Ordering::Relaxed)
    }

    /// Number of live subscriptions.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Releases the subscriptions and closes the producer, keeping the stream.
    ///
    /// Emissions queued so far can still be received from the returned stream.
    pub fn into_stream(self) -> EmissionStream<A> {
        let Emissions {
            connections,
            producer,
            stream,
        } = self;
        drop(connections);
        drop(producer);
        stream
    }
}

/// Subscribes to every signal in `sources` and collects their firings into one stream.
///
/// The stream outlives nothing: dropping the returned [`Emissions`] unsubscribes and
/// closes the producer. Use [`Emissions::into_stream`] to keep consuming afterwards.
pub fn open_emissions<A>(sources: &[Signal<A>], capacity: Capacity) -> Emissions<A>
where
    A: Clone + Send + 'static,
{
    let (tx, rx) = channel(capacity);
    let producer = Arc::new(Producer {
        tx: Mutex::new(Some(tx)),
        dropped: AtomicU64::new(0),
    });

    let mut connections = ConnectionStack::new();
    for signal in sources {
        let source = signal.id();
        let producer = Arc::clone(&producer);
        connections.push(signal.connect(move |args| producer.send(Emission::new(source, args))));
    }

    Emissions {
        connections,
        producer: ProducerGuard(producer),
        stream: EmissionStream { rx },
    }
}

/// Opens an emission stream for the duration of `body`.
///
/// `body` owns the [`Emissions`]; both sides are closed when it drops them, at the
/// latest when it returns.
///
/// `body` may still hand the stream out through [`Emissions::into_stream`]. Such a
/// stream is already detached from every source: it yields what was queued before
/// the call and then ends.
pub async fn enter_emissions<A, B, Fut>(
    sources: &[Signal<A>],
    capacity: Capacity,
    body: B,
) -> Fut::Output
where
    A: Clone + Send + 'static,
    B: FnOnce(Emissions<A>) -> Fut,
    Fut: Future,
{
    let emissions = open_emissions(sources, capacity);
    body(emissions).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::executor::block_on;

    #[test]
    fn test_n_firings_in_order() {
        let sig = Signal::<u32>::new("value");
        let mut emissions = open_emissions(std::slice::from_ref(&sig), Capacity::Unbounded);

        for v in 0..50 {
            sig.emit(v);
        }
        emissions.close_producer();

        let got: Vec<_> = block_on(emissions.stream_mut().collect::<Vec<_>>());
        assert_eq!(got.len(), 50);
        for (i, e) in got.iter().enumerate() {
            assert!(e.is_from(&sig));
            assert_eq!(*e.args(), i as u32);
        }
    }

    #[test]
    fn test_fan_in_keeps_attribution() {
        let a = Signal::<&'static str>::new("a");
        let b = Signal::<&'static str>::new("b");
        let emissions = open_emissions(&[a.clone(), b.clone()], Capacity::Unbounded);

        a.emit("first");
        b.emit("second");
        a.emit("third");

        let mut stream = emissions.into_stream();
        assert_eq!(a.connection_count(), 0);
        let got: Vec<_> = block_on(stream.by_ref().collect::<Vec<_>>());
        let sources: Vec<_> = got.iter().map(|e| e.is_from(&a)).collect();
        assert_eq!(sources, vec![true, false, true]);
        assert!(got[1].is_from(&b));
        assert_eq!(
            got.into_iter().map(Emission::into_args).collect::<Vec<_>>(),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_bounded_drops_excess_without_blocking() {
        let sig = Signal::<u32>::new("burst");
        let mut emissions = open_emissions(std::slice::from_ref(&sig), Capacity::Bounded(3));

        for v in 0..10 {
            sig.emit(v);
        }
        assert_eq!(emissions.dropped(), 7);

        emissions.close_producer();
        let got: Vec<u32> = block_on(emissions.stream_mut().map(Emission::into_args).collect());
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn test_close_is_idempotent() {
        let sig = Signal::<()>::new("sig");
        let mut emissions = open_emissions(std::slice::from_ref(&sig), Capacity::Unbounded);
        sig.emit(());

        emissions.close_producer();
        emissions.close_producer();
        assert!(emissions.is_producer_closed());

        // firings after close are ignored, queued ones still arrive
        sig.emit(());
        assert!(emissions.stream_mut().try_recv().is_some());
        assert!(block_on(emissions.recv()).is_none());
    }

    #[test]
    fn test_drop_releases_subscriptions() {
        let a = Signal::<u8>::new("a");
        let b = Signal::<u8>::new("b");
        let emissions = open_emissions(&[a.clone(), b.clone()], Capacity::Unbounded);
        assert_eq!(emissions.connection_count(), 2);
        assert_eq!(a.connection_count(), 1);
        drop(emissions);
        assert_eq!(a.connection_count() + b.connection_count(), 0);
    }

    #[test]
    fn test_enter_emissions_scope() {
        let sig = Signal::<u8>::new("sig");
        let count = block_on(enter_emissions(
            std::slice::from_ref(&sig),
            Capacity::Unbounded,
            |mut emissions| {
                sig.emit(1);
                sig.emit(2);
                emissions.close_producer();
                async move {
                    let mut n = 0;
                    while emissions.recv().await.is_some() {
                        n += 1;
                    }
                    n
                }
            },
        ));
        assert_eq!(count, 2);
        assert_eq!(sig.connection_count(), 0);
    }

    #[test]
    fn test_stream_returned_from_enter_emissions_is_detached() {
        let sig = Signal::<u8>::new("sig");
        let stream = block_on(enter_emissions(
            std::slice::from_ref(&sig),
            Capacity::Unbounded,
            |emissions| {
                sig.emit(1);
                async move { emissions.into_stream() }
            },
        ));
        assert_eq!(sig.connection_count(), 0);

        sig.emit(2);
        let rest: Vec<_> = block_on(stream.collect());
        assert_eq!(rest.len(), 1);
    }
}
