use std::collections::{BTreeMap, HashMap};

use crossbeam_channel::Sender;
use tidings_types::{Event, SubscriptionId, TopicId};

/// Registry-side half of one subscription.
pub(crate) struct Slot<P> {
    pub(crate) sender: Sender<Event<P>>,
}

/// Topic -> subscriptions, plus the bus-closed flag.
///
/// A topic key exists only while it has at least one subscription. Ids are
/// monotonic, so iterating a topic's `BTreeMap` visits subscriptions in the
/// order they were created.
pub(crate) struct Registry<P> {
    topics: HashMap<TopicId, BTreeMap<SubscriptionId, Slot<P>>>,
    closed: bool,
}

impl<P> Registry<P> {
    pub(crate) fn new() -> Self {
        Self {
            topics: HashMap::new(),
            closed: false,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn insert(&mut self, topic: TopicId, id: SubscriptionId, slot: Slot<P>) {
        self.topics.entry(topic).or_default().insert(id, slot);
    }

    /// Remove exactly one registration, closing its queue.
    ///
    /// Returns `false` if it was already gone.
    pub(crate) fn remove(&mut self, topic: &TopicId, id: SubscriptionId) -> bool {
        let Some(slots) = self.topics.get_mut(topic) else {
            return false;
        };
        let removed = slots.remove(&id).is_some();
        if slots.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Flip to closed and drop every registration. Returns what was removed.
    pub(crate) fn close(&mut self) -> Vec<(TopicId, SubscriptionId)> {
        self.closed = true;
        self.topics
            .drain()
            .flat_map(|(topic, slots)| {
                slots
                    .into_keys()
                    .map(move |id| (topic.clone(), id))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub(crate) fn slots(
        &self,
        topic: &TopicId,
    ) -> impl Iterator<Item = (&SubscriptionId, &Slot<P>)> + '_ {
        self.topics.get(topic).into_iter().flat_map(|slots| slots.iter())
    }

    pub(crate) fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, BTreeMap::len)
    }

    pub(crate) fn topics(&self) -> Vec<TopicId> {
        let mut topics: Vec<_> = self.topics.keys().cloned().collect();
        topics.sort();
        topics
    }
}
