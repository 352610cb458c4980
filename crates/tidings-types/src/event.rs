//! Events and the identifiers used to route them.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable topic name. Matching is exact string equality; there are no
/// wildcards or hierarchies.
///
/// Backed by `Arc<str>` so registry keys, events and notices can share one
/// allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicId(Arc<str>);

impl TopicId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TopicId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&TopicId> for TopicId {
    fn from(value: &TopicId) -> Self {
        value.clone()
    }
}

impl Borrow<str> for TopicId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TopicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for TopicId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TopicId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(TopicId::from)
    }
}

/// Identifies one registration under one topic.
///
/// Issued from a per-bus counter and never reused, so ids also record
/// subscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A published event: a topic plus an opaque payload.
///
/// The bus never looks inside `payload`; it is cloned once per delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<P> {
    pub topic: TopicId,
    pub payload: P,
}

impl<P> Event<P> {
    pub fn new(topic: impl Into<TopicId>, payload: P) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Split into topic and payload.
    pub fn into_parts(self) -> (TopicId, P) {
        (self.topic, self.payload)
    }
}

/// Event carrying an arbitrary JSON payload, for callers that need
/// "any value" semantics at the boundary.
pub type DynEvent = Event<serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn topic_equality_is_exact() {
        assert_eq!(TopicId::from("orders"), TopicId::from("orders".to_string()));
        assert_ne!(TopicId::from("orders"), TopicId::from("Orders"));
        assert_ne!(TopicId::from("orders"), TopicId::from("orders.eu"));
    }

    #[test]
    fn topic_serializes_as_plain_string() {
        let json = serde_json::to_string(&TopicId::from("orders")).unwrap();
        assert_eq!(json, "\"orders\"");
        let back: TopicId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "orders");
    }

    #[test]
    fn subscription_id_display() {
        assert_eq!(SubscriptionId::from_raw(7).to_string(), "sub-7");
    }

    #[test]
    fn dyn_event_carries_any_json() {
        let event: DynEvent = Event::new("orders", json!({"sku": "A-1", "qty": 3}));
        let (topic, payload) = event.into_parts();
        assert_eq!(topic.as_str(), "orders");
        assert_eq!(payload["qty"], 3);
    }
}
