//! Fair round-robin packet dispatcher.
//!
//! [`Dispatcher`] delivers messages from many sources to a single
//! [`Handler`], isolating sources from each other via a per-source queue, a
//! scheduling ring, and a give-up/eviction path for sources that stop making
//! progress. It assumes a single logical caller at a time — see
//! [`SerializedDispatcher`] for the safe-to-share wrapper.
//!
//! The drain algorithm below resolves a genuine tension between two worked
//! examples in the scheduling contract this module implements (see
//! DESIGN.md): a head-vs-arrival mismatch always counts as a skip, but once
//! a call actually starts draining, it keeps scanning ring order for
//! whichever source has something queued — not just the one source that
//! triggered the drain — until nobody does. That's what lets a single
//! `dispatch` call flush an entire backlog burst rather than one message at
//! a time.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use async_trait::async_trait;

use crate::error::ConfigError;

/// The external collaborator that actually consumes `(source, message)` pairs.
///
/// Its reliability is not assumed: an `Err` return is caught by the drain
/// loop, logged, and treated as a successful consumption of the message —
/// see [`Dispatcher::dispatch`].
#[async_trait]
pub trait Handler<S, M>: Send + Sync
where
    S: Send + 'static,
    M: Send + 'static,
{
    /// Error type returned by a failed handler invocation. Never propagated
    /// to a `dispatch` caller; only logged.
    type Error: std::fmt::Debug + Send + 'static;

    /// Consume one message from one source.
    async fn handle(&self, source: S, message: M) -> Result<(), Self::Error>;
}

/// Construction-time configuration for a [`Dispatcher`].
///
/// `give_up_after_skipped` and `drop_source_after_retries` are unsigned, so
/// the "must not be negative" rejection the contract describes is enforced
/// by the type system rather than at runtime — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Per-source backlog cap. Must be greater than zero.
    pub max_source_queue_size: usize,
    /// How many consecutive head/arrival mismatches to tolerate before
    /// giving up on the current head for this scheduling turn.
    pub give_up_after_skipped: u32,
    /// How many consecutive give-ups a single source can accumulate before
    /// it is evicted entirely.
    pub drop_source_after_retries: u32,
}

impl DispatcherConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_source_queue_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        Ok(())
    }
}

/// The core dispatcher state machine.
///
/// Not `Sync`: its methods assume a single logical caller, per the
/// scheduling contract. Wrap in [`SerializedDispatcher`] to share across
/// concurrent producers.
pub struct Dispatcher<S, M, H>
where
    H: Handler<S, M>,
{
    handler: H,
    config: DispatcherConfig,
    ring: VecDeque<S>,
    queues: HashMap<S, VecDeque<M>>,
    retries: HashMap<S, u32>,
    skipped: u32,
}

impl<S, M, H> Dispatcher<S, M, H>
where
    S: Clone + Eq + Hash + Send + 'static,
    M: Send + 'static,
    H: Handler<S, M>,
{
    /// Build a dispatcher. Fails if `config` is invalid (see
    /// [`DispatcherConfig`]).
    pub fn new(handler: H, config: DispatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            handler,
            config,
            ring: VecDeque::new(),
            queues: HashMap::new(),
            retries: HashMap::new(),
            skipped: 0,
        })
    }

    /// Submit one message from one source. Resolves once the dispatcher has
    /// quiesced whatever work this call triggered — zero or more handler
    /// invocations, possibly a rotation or eviction of some other source.
    ///
    /// Never fails: queue overflow is a silent drop, handler failure is
    /// caught and logged. See the crate-level error-handling notes.
    pub async fn dispatch(&mut self, source: S, message: M) {
        self.ensure_source(&source);
        self.try_enqueue(&source, message);
        self.drain(&source).await;
    }

    fn ensure_source(&mut self, source: &S) {
        if !self.queues.contains_key(source) {
            self.ring.push_back(source.clone());
            self.queues.insert(source.clone(), VecDeque::new());
            self.retries.insert(source.clone(), 0);
        }
    }

    fn try_enqueue(&mut self, source: &S, message: M) {
        let queue = self
            .queues
            .get_mut(source)
            .expect("ensure_source always runs before try_enqueue");
        if queue.len() < self.config.max_source_queue_size {
            queue.push_back(message);
            self.retries.insert(source.clone(), 0);
        } else {
            log::debug!("source queue full, dropping arriving message");
        }
    }

    async fn drain(&mut self, arriving: &S) {
        let head = self
            .ring
            .front()
            .cloned()
            .expect("ensure_source guarantees a non-empty ring here");

        if &head == arriving {
            self.handle_next().await;
            return;
        }

        self.skipped += 1;
        if self.skipped < self.config.give_up_after_skipped {
            return;
        }
        self.give_up(&head);
        self.handle_next().await;
    }

    /// Greedily serve whichever source in ring order has a pending message,
    /// rotating each served source to the tail, until none do.
    async fn handle_next(&mut self) {
        loop {
            let next = self
                .ring
                .iter()
                .find(|s| self.queues.get(*s).is_some_and(|q| !q.is_empty()))
                .cloned();
            let Some(source) = next else {
                return;
            };
            let message = self
                .queues
                .get_mut(&source)
                .expect("source came from the ring scan above")
                .pop_front()
                .expect("source was selected for having a non-empty queue");

            if let Err(err) = self.handler.handle(source.clone(), message).await {
                log::warn!("handler failed, message treated as consumed: {err:?}");
            }
            self.success(&source);
        }
    }

    fn give_up(&mut self, source: &S) {
        self.skipped = 0;
        let retries = self.retries.entry(source.clone()).or_insert(0);
        *retries += 1;
        if *retries > self.config.drop_source_after_retries {
            self.drop_source(source);
        } else {
            self.rotate_to_tail(source);
        }
    }

    fn success(&mut self, source: &S) {
        self.skipped = 0;
        self.rotate_to_tail(source);
    }

    fn drop_source(&mut self, source: &S) {
        self.ring.retain(|s| s != source);
        self.queues.remove(source);
        self.retries.remove(source);
    }

    fn rotate_to_tail(&mut self, source: &S) {
        if let Some(pos) = self.ring.iter().position(|s| s == source) {
            if let Some(v) = self.ring.remove(pos) {
                self.ring.push_back(v);
            }
        }
    }

    /// Number of distinct sources currently tracked (ring/queue/retries key set).
    #[cfg(test)]
    pub(crate) fn source_count(&self) -> usize {
        self.ring.len()
    }

    #[cfg(test)]
    pub(crate) fn ring_snapshot(&self) -> Vec<S> {
        self.ring.iter().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn queue_len(&self, source: &S) -> usize {
        self.queues.get(source).map_or(0, VecDeque::len)
    }

    #[cfg(test)]
    pub(crate) fn retries_of(&self, source: &S) -> Option<u32> {
        self.retries.get(source).copied()
    }

    #[cfg(test)]
    pub(crate) fn skipped_count(&self) -> u32 {
        self.skipped
    }
}

/// A [`Dispatcher`] wrapped in a mutex so it can be shared across concurrent
/// producers, with at most one `dispatch` call in its critical section at a
/// time. Fairness of lock acquisition is not guaranteed.
pub struct SerializedDispatcher<S, M, H>
where
    H: Handler<S, M>,
{
    inner: tokio::sync::Mutex<Dispatcher<S, M, H>>,
}

impl<S, M, H> SerializedDispatcher<S, M, H>
where
    S: Clone + Eq + Hash + Send + 'static,
    M: Send + 'static,
    H: Handler<S, M>,
{
    /// Build a serialized dispatcher. Fails under the same conditions as
    /// [`Dispatcher::new`].
    pub fn new(handler: H, config: DispatcherConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: tokio::sync::Mutex::new(Dispatcher::new(handler, config)?),
        })
    }

    /// Submit one message from one source, serialized against any other
    /// concurrent `dispatch` call on this instance.
    pub async fn dispatch(&self, source: S, message: M) {
        let mut guard = self.inner.lock().await;
        guard.dispatch(source, message).await;
    }

    #[cfg(test)]
    pub(crate) async fn source_count(&self) -> usize {
        self.inner.lock().await.source_count()
    }
}
