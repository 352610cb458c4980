//! In-process, topic-keyed publish/subscribe event bus.
//!
//! Publishers emit [`Event`]s tagged with a topic; every subscriber gets its
//! own bounded queue. Publishing never blocks: a full queue drops the event
//! for that subscriber only, and the drop is reported to the bus's
//! [`NoticeSink`] instead of the publisher.

pub mod bus;
pub mod config;
pub mod sink;

pub use bus::{BusStats, Detach, DynEventBus, EventBus, PublishReport, Subscription};
pub use sink::{FanoutSink, MemorySink, NoticeSink, NullSink, TracingSink};
pub use tidings_types::{
    BusConfig, BusError, BusNotice, ConfigError, DropReason, DynEvent, Event, NoticeKind,
    SubscriptionId, TidingsConfig, TopicId,
};
