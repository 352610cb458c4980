//! Observability sinks for bus notices.
//!
//! The bus reports every subscribe, unsubscribe, delivery and drop as a
//! [`BusNotice`]. Where those go is up to the sink handed to the bus:
//! [`TracingSink`] turns them into `tracing` events, [`MemorySink`] records
//! them for assertions, and any `Fn(&BusNotice)` closure works too.
//!
//! Sinks are called outside the registry lock but on the publishing thread,
//! so they should return quickly.
//!
//! Notices from one call arrive in order, but there is no ordering across
//! concurrent calls. A detach racing a publish can report `Unsubscribed` for
//! a subscription before the `Delivered` for an event it already received.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tidings_types::{BusNotice, NoticeKind};
use tracing::{debug, info, warn};

/// Receives structured notices from an [`EventBus`](crate::EventBus).
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: &BusNotice);
}

impl<F> NoticeSink for F
where
    F: Fn(&BusNotice) + Send + Sync,
{
    fn notify(&self, notice: &BusNotice) {
        self(notice)
    }
}

/// Logs notices through `tracing`.
///
/// Subscribe/unsubscribe at `info`, deliveries at `debug`, drops at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notify(&self, notice: &BusNotice) {
        let topic = notice.topic.as_str();
        let subscription = notice.subscription.map(|id| id.as_u64());
        let detail = notice.detail.as_deref().unwrap_or_default();
        match notice.kind {
            NoticeKind::Subscribed => {
                info!(topic, ?subscription, detail, "subscribed to topic")
            }
            NoticeKind::Unsubscribed => {
                info!(topic, ?subscription, detail, "unsubscribed from topic")
            }
            NoticeKind::Delivered => debug!(topic, ?subscription, "delivered event"),
            NoticeKind::Dropped => warn!(topic, ?subscription, detail, "dropped event"),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NoticeSink for NullSink {
    fn notify(&self, _notice: &BusNotice) {}
}

/// Records notices in memory. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    notices: Arc<Mutex<Vec<BusNotice>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far, in arrival order.
    pub fn notices(&self) -> Vec<BusNotice> {
        self.notices.lock().clone()
    }

    pub fn of_kind(&self, kind: NoticeKind) -> Vec<BusNotice> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.kind == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.lock().iter().filter(|n| n.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<BusNotice> {
        std::mem::take(&mut *self.notices.lock())
    }
}

impl NoticeSink for MemorySink {
    fn notify(&self, notice: &BusNotice) {
        self.notices.lock().push(notice.clone());
    }
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("recorded", &self.len())
            .finish()
    }
}

/// Forwards every notice to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn NoticeSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl NoticeSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl NoticeSink for FanoutSink {
    fn notify(&self, notice: &BusNotice) {
        for sink in &self.sinks {
            sink.notify(notice);
        }
    }
}

impl fmt::Debug for FanoutSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanoutSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
