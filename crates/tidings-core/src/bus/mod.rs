//! Topic registry, subscription lifecycle, and non-blocking broadcast.
//!
//! The registry and the bus-closed flag share one `parking_lot::RwLock`:
//! publishing takes the read side so publishers run in parallel, while
//! subscribe, unsubscribe and shutdown take the write side. Each
//! subscription is a `crossbeam-channel` bounded queue whose only sender
//! lives in the registry, so removing the entry is what closes the queue.

mod event_bus;
mod registry;
mod subscription;

pub use event_bus::{BusStats, DynEventBus, EventBus, PublishReport};
pub use subscription::{Detach, IntoIter, Subscription};
