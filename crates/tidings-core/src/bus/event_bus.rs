use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{TrySendError, bounded};
use parking_lot::RwLock;
use tidings_types::{
    BusConfig, BusError, BusNotice, DropReason, Event, SubscriptionId, TopicId,
};
use tracing::{debug, info};

use super::registry::{Registry, Slot};
use super::subscription::{Detach, Subscription};
use crate::sink::{NoticeSink, TracingSink};

/// Outcome of a single publish across the topic's subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers whose queue accepted the event.
    pub delivered: usize,
    /// Subscribers that missed it (queue full or consumer gone).
    pub dropped: usize,
}

/// Running totals since the bus was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Accepted publish calls, including those with no subscribers.
    pub published: u64,
    /// Per-subscriber enqueues that succeeded.
    pub delivered: u64,
    /// Per-subscriber delivery attempts that were dropped.
    pub dropped: u64,
}

pub(crate) struct Inner<P> {
    registry: RwLock<Registry<P>>,
    next_id: AtomicU64,
    config: BusConfig,
    sink: Box<dyn NoticeSink>,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl<P> Inner<P> {
    /// Remove one registration and close its queue.
    ///
    /// Emits a single `Unsubscribed` notice when something was removed;
    /// redundant calls are silent.
    pub(crate) fn remove(&self, topic: &TopicId, id: SubscriptionId, cause: &str) -> bool {
        let removed = self.registry.write().remove(topic, id);
        if removed {
            self.sink
                .notify(&BusNotice::unsubscribed(topic.clone(), id, cause));
        }
        removed
    }
}

/// Topic-keyed publish/subscribe bus.
///
/// Cloning is cheap and every clone shares the same registry. When the last
/// clone is dropped all remaining queues close, the same as [`shutdown`].
///
/// [`shutdown`]: EventBus::shutdown
pub struct EventBus<P> {
    inner: Arc<Inner<P>>,
}

/// Bus whose payload is any JSON value.
pub type DynEventBus = EventBus<serde_json::Value>;

impl<P> EventBus<P>
where
    P: Clone + Send + 'static,
{
    /// Bus with default settings that logs notices through `tracing`.
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }

    /// Bus with default settings that reports notices to `sink`.
    pub fn with_sink(sink: impl NoticeSink + 'static) -> Self {
        Self::from_config(&BusConfig::default(), sink)
    }

    /// Bus using `config` for default and maximum queue capacity.
    pub fn from_config(config: &BusConfig, sink: impl NoticeSink + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry::new()),
                next_id: AtomicU64::new(1),
                config: config.clone(),
                sink: Box::new(sink),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Settings the bus was built with.
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Register a new bounded queue under `topic`.
    ///
    /// Every call creates a distinct queue, even for a repeated
    /// `(topic, capacity)` pair. With capacity 0 an event is only delivered
    /// if the consumer is already blocked in `recv`; otherwise it is dropped.
    ///
    /// # Errors
    ///
    /// [`BusError::Closed`] after [`shutdown`](Self::shutdown).
    pub fn subscribe(
        &self,
        topic: impl Into<TopicId>,
        capacity: usize,
    ) -> Result<(Subscription<P>, Detach<P>), BusError> {
        let topic = topic.into();
        let capacity = self.inner.config.clamp_capacity(capacity);
        let (sender, receiver) = bounded(capacity);

        let id = {
            let mut registry = self.inner.registry.write();
            if registry.is_closed() {
                return Err(BusError::Closed);
            }
            let id = SubscriptionId::from_raw(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
            registry.insert(topic.clone(), id, Slot { sender });
            id
        };

        self.inner
            .sink
            .notify(&BusNotice::subscribed(topic.clone(), id, capacity));

        Ok((
            Subscription::new(id, topic.clone(), capacity, receiver, Arc::downgrade(&self.inner)),
            Detach::new(Arc::downgrade(&self.inner), topic, id),
        ))
    }

    /// [`subscribe`](Self::subscribe) with the configured default capacity.
    pub fn subscribe_default(
        &self,
        topic: impl Into<TopicId>,
    ) -> Result<(Subscription<P>, Detach<P>), BusError> {
        self.subscribe(topic, self.inner.config.default_capacity)
    }

    /// Remove the registration `id` under `topic` and close its queue.
    ///
    /// Returns `true` only if this call removed it. Unknown or
    /// already-removed ids are a silent no-op.
    pub fn unsubscribe(&self, topic: &TopicId, id: SubscriptionId) -> bool {
        self.inner.remove(topic, id, "unsubscribed")
    }

    /// Offer `event` to every queue registered under its topic.
    ///
    /// Never waits on a consumer: a full queue drops the event for that
    /// subscriber only. A queue whose consumer is already gone (normally
    /// unregistered when its `Subscription` drops) counts as a drop and is
    /// unregistered afterwards.
    ///
    /// # Errors
    ///
    /// [`BusError::Closed`] after [`shutdown`](Self::shutdown).
    pub fn publish(&self, event: Event<P>) -> Result<PublishReport, BusError> {
        let mut report = PublishReport::default();
        let mut notices = Vec::new();
        let mut stale = Vec::new();

        {
            let registry = self.inner.registry.read();
            if registry.is_closed() {
                return Err(BusError::Closed);
            }
            for (&id, slot) in registry.slots(&event.topic) {
                let outcome = match slot.sender.try_send(event.clone()) {
                    Ok(()) => None,
                    Err(TrySendError::Full(_)) => Some(DropReason::Full),
                    Err(TrySendError::Disconnected(_)) => {
                        stale.push(id);
                        Some(DropReason::Disconnected)
                    }
                };
                match outcome {
                    None => {
                        report.delivered += 1;
                        notices.push(BusNotice::delivered(event.topic.clone(), id));
                    }
                    Some(reason) => {
                        report.dropped += 1;
                        notices.push(BusNotice::dropped(event.topic.clone(), id, reason));
                    }
                }
            }
        }

        self.inner.published.fetch_add(1, Ordering::Relaxed);
        self.inner
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.inner
            .dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        for notice in &notices {
            self.inner.sink.notify(notice);
        }
        for id in stale {
            debug!(topic = %event.topic, subscription = id.as_u64(), "reaping abandoned subscription");
            self.inner.remove(&event.topic, id, DropReason::Disconnected.as_str());
        }

        Ok(report)
    }
}

impl<P> EventBus<P> {
    /// Close the bus and every queue registered on it.
    ///
    /// Blocked consumers wake up and see end of stream once drained. Later
    /// `subscribe`/`publish` calls fail with [`BusError::Closed`]; inspection
    /// still works. Calling this again does nothing.
    pub fn shutdown(&self) {
        let removed = {
            let mut registry = self.inner.registry.write();
            if registry.is_closed() {
                return;
            }
            registry.close()
        };

        info!(subscriptions = removed.len(), "event bus shut down");
        for (topic, id) in removed {
            self.inner
                .sink
                .notify(&BusNotice::unsubscribed(topic, id, "bus shutdown"));
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.registry.read().is_closed()
    }

    /// Active subscriptions under `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.registry.read().subscriber_count(topic)
    }

    /// Topics with at least one active subscription, sorted.
    pub fn topics(&self) -> Vec<TopicId> {
        self.inner.registry.read().topics()
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.inner.published.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<P> Default for EventBus<P>
where
    P: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("EventBus")
            .field("topics", &registry.topics().len())
            .field("closed", &registry.is_closed())
            .finish()
    }
}
