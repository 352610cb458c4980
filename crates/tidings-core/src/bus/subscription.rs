use std::fmt;
use std::sync::Weak;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use tidings_types::{DropReason, Event, SubscriptionId, TopicId};

use super::event_bus::Inner;

/// Read side of one subscription's bounded queue.
///
/// Events arrive in publish order. Once the subscription is detached (or the
/// bus shuts down or is dropped) the queue is closed: buffered events can
/// still be drained, after which [`recv`](Self::recv) returns `None`.
///
/// Dropping a `Subscription` unregisters it, the same as detaching. A
/// `Detach` for the same registration then becomes a no-op.
pub struct Subscription<P> {
    id: SubscriptionId,
    topic: TopicId,
    capacity: usize,
    receiver: Receiver<Event<P>>,
    bus: Weak<Inner<P>>,
}

impl<P> Subscription<P> {
    pub(crate) fn new(
        id: SubscriptionId,
        topic: TopicId,
        capacity: usize,
        receiver: Receiver<Event<P>>,
        bus: Weak<Inner<P>>,
    ) -> Self {
        Self {
            id,
            topic,
            capacity,
            receiver,
            bus,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &TopicId {
        &self.topic
    }

    /// Queue capacity after any configured clamp.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until an event arrives. `None` means end of stream.
    pub fn recv(&self) -> Option<Event<P>> {
        self.receiver.recv().ok()
    }

    pub fn try_recv(&self) -> Result<Event<P>, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event<P>, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Events currently buffered.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Blocking iterator that ends when the queue is closed and drained.
    pub fn iter(&self) -> crossbeam_channel::Iter<'_, Event<P>> {
        self.receiver.iter()
    }

    /// Non-blocking iterator over what is buffered right now.
    pub fn try_iter(&self) -> crossbeam_channel::TryIter<'_, Event<P>> {
        self.receiver.try_iter()
    }
}

impl<P> Drop for Subscription<P> {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(&self.topic, self.id, DropReason::Disconnected.as_str());
        }
    }
}

/// Owning blocking iterator over a [`Subscription`].
///
/// Ends when the queue is closed and drained. Dropping it unregisters the
/// subscription.
#[derive(Debug)]
pub struct IntoIter<P> {
    subscription: Subscription<P>,
}

impl<P> Iterator for IntoIter<P> {
    type Item = Event<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.subscription.recv()
    }
}

impl<P> IntoIterator for Subscription<P> {
    type Item = Event<P>;
    type IntoIter = IntoIter<P>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { subscription: self }
    }
}

impl<'a, P> IntoIterator for &'a Subscription<P> {
    type Item = Event<P>;
    type IntoIter = crossbeam_channel::Iter<'a, Event<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.receiver.iter()
    }
}

impl<P> fmt::Debug for Subscription<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("capacity", &self.capacity)
            .field("buffered", &self.receiver.len())
            .finish()
    }
}

/// Detach capability bound to exactly one registration.
///
/// Holds only a weak reference to the bus, so it never keeps a bus alive and
/// detaching after the bus is gone is a no-op. Safe to call any number of
/// times from any thread; only the first effective call does anything.
pub struct Detach<P> {
    bus: Weak<Inner<P>>,
    topic: TopicId,
    id: SubscriptionId,
}

impl<P> Detach<P> {
    pub(crate) fn new(bus: Weak<Inner<P>>, topic: TopicId, id: SubscriptionId) -> Self {
        Self { bus, topic, id }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn topic(&self) -> &TopicId {
        &self.topic
    }

    /// Unsubscribe and close the queue.
    ///
    /// Returns `true` only on the call that actually removed the registration.
    pub fn detach(&self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.remove(&self.topic, self.id, "detached"),
            None => false,
        }
    }
}

impl<P> Clone for Detach<P> {
    fn clone(&self) -> Self {
        Self {
            bus: Weak::clone(&self.bus),
            topic: self.topic.clone(),
            id: self.id,
        }
    }
}

impl<P> fmt::Debug for Detach<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detach")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("bus_alive", &(self.bus.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use crate::bus::EventBus;
    use crate::sink::{MemorySink, NullSink};
    use tidings_types::{Event, NoticeKind};

    use super::*;

    #[test]
    fn recv_after_detach_drains_then_ends() {
        let bus = EventBus::with_sink(NullSink);
        let (sub, detach) = bus.subscribe("orders", 4).unwrap();
        bus.publish(Event::new("orders", 1)).unwrap();
        bus.publish(Event::new("orders", 2)).unwrap();

        assert!(detach.detach());

        let drained: Vec<i32> = sub.iter().map(|e| e.payload).collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(sub.recv().is_none());
        assert_eq!(sub.try_recv(), Err(TryRecvError::Disconnected));
    }

    #[test]
    fn try_recv_on_open_empty_queue_is_empty() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (sub, _detach) = bus.subscribe("orders", 1).unwrap();
        assert_eq!(sub.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(
            sub.recv_timeout(Duration::from_millis(10)),
            Err(RecvTimeoutError::Timeout)
        );
        assert!(sub.is_empty());
    }

    #[test]
    fn blocked_consumer_wakes_on_detach() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (sub, detach) = bus.subscribe("orders", 1).unwrap();

        let consumer = thread::spawn(move || sub.into_iter().count());
        thread::sleep(Duration::from_millis(20));
        detach.detach();

        assert_eq!(consumer.join().unwrap(), 0);
    }

    #[test]
    fn detach_is_usable_from_another_thread() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (_sub, detach) = bus.subscribe("orders", 1).unwrap();
        let remote = detach.clone();

        let first = thread::spawn(move || remote.detach()).join().unwrap();
        assert!(first);
        assert!(!detach.detach());
        assert_eq!(bus.subscriber_count("orders"), 0);
    }

    #[test]
    fn detach_after_bus_dropped_is_noop() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (sub, detach) = bus.subscribe("orders", 1).unwrap();
        drop(bus);

        assert!(!detach.detach());
        // Last bus handle gone, so the queue closed with it.
        assert!(sub.recv().is_none());
    }

    #[test]
    fn dropping_subscription_unregisters_it() {
        let sink = MemorySink::new();
        let bus: EventBus<i32> = EventBus::with_sink(sink.clone());
        let (sub, detach) = bus.subscribe("orders", 1).unwrap();
        let (_other, _d) = bus.subscribe("orders", 1).unwrap();

        drop(sub);

        assert_eq!(bus.subscriber_count("orders"), 1);
        assert!(!detach.detach());
        let unsubscribed = sink.of_kind(NoticeKind::Unsubscribed);
        assert_eq!(unsubscribed.len(), 1);
        assert_eq!(unsubscribed[0].detail.as_deref(), Some("receiver dropped"));
    }

    #[test]
    fn dropped_subscriptions_do_not_accumulate_topics() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        for i in 0..100 {
            let (sub, _detach) = bus.subscribe(format!("t{i}"), 1).unwrap();
            drop(sub);
        }
        assert!(bus.topics().is_empty());
        assert_eq!(bus.subscriber_count("t0"), 0);
    }

    #[test]
    fn drop_after_detach_is_silent() {
        let sink = MemorySink::new();
        let bus: EventBus<i32> = EventBus::with_sink(sink.clone());
        let (sub, detach) = bus.subscribe("orders", 1).unwrap();

        assert!(detach.detach());
        drop(sub);

        assert_eq!(sink.count(NoticeKind::Unsubscribed), 1);
    }

    #[test]
    fn dropping_owning_iterator_unregisters() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (sub, _detach) = bus.subscribe("orders", 2).unwrap();
        bus.publish(Event::new("orders", 1)).unwrap();

        let mut iter = sub.into_iter();
        assert_eq!(iter.next().map(|e| e.payload), Some(1));
        assert_eq!(bus.subscriber_count("orders"), 1);

        drop(iter);
        assert_eq!(bus.subscriber_count("orders"), 0);
    }

    #[test]
    fn debug_impls() {
        let bus: EventBus<i32> = EventBus::with_sink(NullSink);
        let (sub, detach) = bus.subscribe("orders", 2).unwrap();
        let sub_debug = format!("{sub:?}");
        assert!(sub_debug.contains("Subscription"));
        assert!(sub_debug.contains("capacity: 2"));
        assert!(format!("{detach:?}").contains("bus_alive: true"));
    }
}
