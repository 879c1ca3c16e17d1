//! Cache Module
//!
//! Provides the in-process TTL cache, its items, counters and lifecycle events.

mod events;
mod item;
mod stats;
mod store;


// Re-export public types
pub use events::{EventConfig, EventHandler, EventKind};
pub use item::CacheItem;
pub use stats::CacheStats;
pub use store::NearCache;
