//! Structured observability notices emitted by the bus.
//!
//! Notices replace fixed console output: the bus hands each one to an
//! injectable sink, which decides whether to log, record, or ignore it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{SubscriptionId, TopicId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Subscribed,
    Unsubscribed,
    Delivered,
    Dropped,
}

/// Why a delivery attempt was dropped for one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Queue at capacity (or capacity 0 with no consumer waiting).
    Full,
    /// The consumer dropped its queue handle without detaching.
    Disconnected,
}

impl DropReason {
    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::Full => "queue full",
            DropReason::Disconnected => "receiver dropped",
        }
    }
}

/// One observability event from the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusNotice {
    pub kind: NoticeKind,
    pub topic: TopicId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl BusNotice {
    pub fn new(kind: NoticeKind, topic: TopicId, subscription: SubscriptionId) -> Self {
        Self {
            kind,
            topic,
            subscription: Some(subscription),
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn subscribed(topic: TopicId, subscription: SubscriptionId, capacity: usize) -> Self {
        Self::new(NoticeKind::Subscribed, topic, subscription)
            .with_detail(format!("capacity={capacity}"))
    }

    pub fn unsubscribed(topic: TopicId, subscription: SubscriptionId, cause: &str) -> Self {
        Self::new(NoticeKind::Unsubscribed, topic, subscription).with_detail(cause)
    }

    pub fn delivered(topic: TopicId, subscription: SubscriptionId) -> Self {
        Self::new(NoticeKind::Delivered, topic, subscription)
    }

    pub fn dropped(topic: TopicId, subscription: SubscriptionId, reason: DropReason) -> Self {
        Self::new(NoticeKind::Dropped, topic, subscription).with_detail(reason.as_str())
    }
}
