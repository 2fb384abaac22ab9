use std::sync::Arc;

use crate::config::RunnerConfig;
use crate::guest::Clock;
use crate::host::HostLoop;
use crate::outcome::Outcomes;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::bridge::{DoneCallback, Runner};

/// Builder for a [`Runner`] with optional features.
pub struct RunnerBuilder<T> {
    host: Arc<dyn HostLoop>,
    config: RunnerConfig,
    clock: Option<Arc<dyn Clock>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    done_callback: Option<DoneCallback<T>>,
}

impl<T: Send + 'static> RunnerBuilder<T> {
    /// Creates a builder with the default configuration.
    pub fn new(host: Arc<dyn HostLoop>) -> Self {
        Self {
            host,
            config: RunnerConfig::default(),
            clock: None,
            subscribers: Vec::new(),
            done_callback: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the guest's time source. Mostly useful with
    /// [`MockClock`](crate::MockClock) to speed up tests with timeouts.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets a callback invoked with the outcomes once the guest finished, before the
    /// host is asked to quit.
    pub fn done_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Outcomes<T>) + Send + 'static,
    {
        self.done_callback = Some(Box::new(callback));
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events inline, in publication order.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the runner. Nothing touches the host until [`Runner::run`].
    pub fn build(self) -> Runner<T> {
        Runner::new_internal(
            self.host,
            self.config,
            self.clock,
            SubscriberSet::new(self.subscribers),
            self.done_callback,
        )
    }
}
