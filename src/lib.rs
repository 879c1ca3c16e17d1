//! Near Cache - An in-process TTL key-value cache
//!
//! Items expire lazily: staleness is detected, and the item reclaimed, only
//! when an operation touches its key. Optional callbacks observe add, delete,
//! update, refresh and expire transitions.
//!
//! ```
//! use near_cache::{cache::EventConfig, NearCache};
//! use std::time::Duration;
//!
//! let events = EventConfig::<String>::new().on_delete(|item| {
//!     println!("item [{}] was deleted", item.value);
//!     Ok(())
//! });
//! let cache = NearCache::with_events(events);
//!
//! cache.add("test1", "test".to_string(), Duration::from_secs(60)).unwrap();
//! assert_eq!(cache.get("test1").unwrap().value, "test");
//! cache.del("test1").unwrap();
//! assert!(!cache.has("test1"));
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheItem, CacheStats, EventConfig, EventKind, NearCache};
pub use config::Config;
pub use error::{CacheError, Result};
