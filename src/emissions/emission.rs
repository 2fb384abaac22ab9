use crate::host::{Signal, SourceId};

/// One captured firing of a [`Signal`].
///
/// Two emissions are equal when they come from the same source (by identity) and carry
/// equal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission<A> {
    source: SourceId,
    args: A,
}

impl<A> Emission<A> {
    pub(crate) fn new(source: SourceId, args: A) -> Self {
        Self { source, args }
    }

    /// Identity of the source that fired.
    pub fn source(&self) -> SourceId {
        self.source
    }

    /// Arguments captured at fire time.
    pub fn args(&self) -> &A {
        &self.args
    }

    /// Consumes the emission, returning its arguments.
    pub fn into_args(self) -> A {
        self.args
    }

    /// Whether this emission came from `signal` (any clone of its handle).
    pub fn is_from(&self, signal: &Signal<A>) -> bool
    where
        A: Clone + Send + 'static,
    {
        self.source == signal.id()
    }
}

/// Buffer policy of an emission stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
    /// Never drops.
    #[default]
    Unbounded,
    /// Holds at most `n` unconsumed emissions (at least 1); further firings are dropped.
    Bounded(usize),
}

impl Capacity {
    /// Bounded capacity clamped to at least 1; `None` when unbounded.
    pub fn limit(self) -> Option<usize> {
        match self {
            Capacity::Unbounded => None,
            Capacity::Bounded(n) => Some(n.max(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_needs_same_source_and_args() {
        let a = Signal::<u8>::new("a");
        let b = Signal::<u8>::new("b");

        let ea = Emission::new(a.id(), 1);
        assert_eq!(ea, Emission::new(a.clone().id(), 1));
        assert_ne!(ea, Emission::new(a.id(), 2));
        assert_ne!(ea, Emission::new(b.id(), 1));
        assert!(ea.is_from(&a.clone()));
        assert!(!ea.is_from(&b));
    }

    #[test]
    fn test_capacity_clamped() {
        assert_eq!(Capacity::Bounded(0).limit(), Some(1));
        assert_eq!(Capacity::Bounded(8).limit(), Some(8));
        assert_eq!(Capacity::default().limit(), None);
    }
}
