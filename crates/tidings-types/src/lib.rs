//! Shared domain types for the tidings event bus.
//!
//! Events, topic and subscription identifiers, observability notices,
//! configuration, and their error types. No runtime dependencies beyond
//! serde, chrono and thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod notice;

pub use config::{BusConfig, LoggingConfig, TidingsConfig};
pub use error::{BusError, ConfigError};
pub use event::{DynEvent, Event, SubscriptionId, TopicId};
pub use notice::{BusNotice, DropReason, NoticeKind};
