//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with lazy TTL expiration
//! and lifecycle events.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheItem, CacheStats, EventConfig, EventKind};
use crate::config::Config;
use crate::error::{CacheError, Result};

/// Map and counters, guarded together so `stats.items` never drifts from
/// `items.len()`.
#[derive(Debug)]
struct Inner<V> {
    items: HashMap<String, CacheItem<V>>,
    stats: Option<CacheStats>,
}

impl<V> Inner<V> {
    fn stats_mut(&mut self) -> Option<&mut CacheStats> {
        self.stats.as_mut()
    }

    fn sync_count(&mut self) {
        let count = self.items.len();
        if let Some(stats) = self.stats.as_mut() {
            stats.set_items(count);
        }
    }
}

/// An event to fire once the lock has been released.
struct Pending<V> {
    kind: EventKind,
    item: CacheItem<V>,
}

// == Near Cache ==
/// Thread-safe in-process cache with per-item TTL.
///
/// Expired items are reclaimed lazily, when an operation touches their key.
/// Every operation holds a single mutex for its whole critical section;
/// event handlers run after it is released.
///
/// ```
/// use near_cache::NearCache;
/// use std::time::Duration;
///
/// let cache = NearCache::new();
/// cache.add("v1", "v1", Duration::from_secs(5)).unwrap();
/// assert_eq!(cache.get("v1").unwrap().value, "v1");
/// ```
#[derive(Debug)]
pub struct NearCache<V> {
    inner: Mutex<Inner<V>>,
    events: EventConfig<V>,
    config: Config,
}

impl<V: Clone> NearCache<V> {
    // == Constructors ==
    /// Creates a cache with the default configuration and no event handlers.
    pub fn new() -> Self {
        Self::with_config(Config::default(), EventConfig::new())
    }

    /// Creates a cache with the default configuration and the given handlers.
    pub fn with_events(events: EventConfig<V>) -> Self {
        Self::with_config(Config::default(), events)
    }

    pub fn with_config(config: Config, events: EventConfig<V>) -> Self {
        let stats = config.track_stats.then(CacheStats::new);
        Self {
            inner: Mutex::new(Inner {
                items: HashMap::new(),
                stats,
            }),
            events,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Add ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// An existing item under the same key is overwritten.
    pub fn add(&self, key: impl Into<String>, value: V, ttl: Duration) -> Result<()> {
        let key = key.into();
        let item = CacheItem::new(value, ttl);
        let pending = self.pending(EventKind::Add, &item);

        {
            let mut inner = self.inner.lock();
            inner.items.insert(key.clone(), item);
            if let Some(stats) = inner.stats_mut() {
                stats.record_addition();
            }
            inner.sync_count();
        }

        debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "item added");
        self.fire(pending);
        Ok(())
    }

    /// Stores `value` under `key` using the configured default TTL.
    pub fn insert(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.add(key, value, self.config.default_ttl)
    }

    // == Get ==
    /// Retrieves the item stored under `key`.
    ///
    /// An expired item is removed on the spot and reported as
    /// [`CacheError::Expired`]; the next lookup reports `NotFound`.
    pub fn get(&self, key: &str) -> Result<CacheItem<V>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let lookup = inner
            .items
            .get(key)
            .map(|item| (!item.is_expired_at(now)).then(|| item.clone()));

        match lookup {
            None => {
                if let Some(stats) = inner.stats_mut() {
                    stats.record_miss();
                }
                Err(CacheError::NotFound(key.to_string()))
            }
            Some(None) => {
                let expired = self.reclaim(&mut inner, key);
                drop(inner);

                debug!(key = %key, "item expired on access");
                self.fire(expired);
                Err(CacheError::Expired(key.to_string()))
            }
            Some(Some(item)) => {
                if let Some(stats) = inner.stats_mut() {
                    stats.record_call();
                }
                Ok(item)
            }
        }
    }

    // == Get And Expire ==
    /// Removes and returns the live item stored under `key`.
    ///
    /// The lookup and the removal happen under one lock acquisition. An
    /// absent or already expired key fails with `NotFound`.
    pub fn get_and_expire(&self, key: &str) -> Result<CacheItem<V>> {
        let mut inner = self.inner.lock();
        let now = Instant::now();

        let Some(item) = inner.items.remove(key) else {
            if let Some(stats) = inner.stats_mut() {
                stats.record_miss();
            }
            return Err(CacheError::NotFound(key.to_string()));
        };
        inner.sync_count();

        let expired = item.is_expired_at(now);
        if let Some(stats) = inner.stats_mut() {
            if expired {
                stats.record_miss();
                stats.record_expiration();
            } else {
                stats.record_call();
            }
        }
        drop(inner);

        debug!(key = %key, expired, "item taken");
        self.events.dispatch(EventKind::Expire, &item);
        if expired {
            return Err(CacheError::NotFound(key.to_string()));
        }
        Ok(item)
    }

    // == Refresh ==
    /// Pushes the expiration of `key` to now plus its original TTL.
    ///
    /// Works on items that are logically expired but not yet reclaimed,
    /// bringing them back to life.
    pub fn refresh(&self, key: &str) -> Result<CacheItem<V>> {
        let item = {
            let mut inner = self.inner.lock();
            let item = inner
                .items
                .get_mut(key)
                .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
            item.refresh();
            item.clone()
        };

        debug!(key = %key, "item refreshed");
        self.events.dispatch(EventKind::Refresh, &item);
        Ok(item)
    }

    /// Alias of [`refresh`](Self::refresh).
    pub fn get_and_refresh(&self, key: &str) -> Result<CacheItem<V>> {
        self.refresh(key)
    }

    // == Update ==
    /// Replaces the value stored under `key` and resets its expiration,
    /// keeping the TTL it was added with.
    pub fn update(&self, key: &str, value: V) -> Result<CacheItem<V>> {
        let item = {
            let mut inner = self.inner.lock();
            let item = inner
                .items
                .get_mut(key)
                .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
            item.replace(value);
            item.clone()
        };

        debug!(key = %key, "item updated");
        self.events.dispatch(EventKind::Update, &item);
        Ok(item)
    }

    // == Delete ==
    /// Removes the item stored under `key`.
    ///
    /// The delete handler receives the removed item.
    pub fn del(&self, key: &str) -> Result<()> {
        let item = {
            let mut inner = self.inner.lock();
            let item = inner
                .items
                .remove(key)
                .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
            inner.sync_count();
            item
        };

        debug!(key = %key, "item deleted");
        self.events.dispatch(EventKind::Delete, &item);
        Ok(())
    }

    // == Has ==
    /// Returns true if `key` is present, without checking expiration.
    ///
    /// An expired item that no operation has touched yet still counts as
    /// present; use [`get`](Self::get) or [`expired`](Self::expired) to
    /// learn whether it is live.
    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().items.contains_key(key)
    }

    // == Expired ==
    /// Returns true if the item under `key` is past its deadline.
    ///
    /// Does not remove the item.
    pub fn expired(&self, key: &str) -> Result<bool> {
        self.inner
            .lock()
            .items
            .get(key)
            .map(CacheItem::is_expired)
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    // == Clean ==
    /// Discards every item. No per-item events are fired.
    pub fn clean(&self) {
        let removed = {
            let mut inner = self.inner.lock();
            let removed = inner.items.len();
            inner.items.clear();
            inner.sync_count();
            removed
        };

        info!("Cache cleaned: removed {} items", removed);
    }

    // == Count ==
    /// Returns the number of stored items, expired-but-unreclaimed included.
    pub fn count(&self) -> usize {
        self.inner.lock().items.len()
    }

    // == Statistics ==
    /// Returns a snapshot of the usage counters, or None if stats are disabled.
    pub fn statistics(&self) -> Option<CacheStats> {
        self.inner.lock().stats.clone()
    }

    /// Removes an expired item and accounts for it, returning its event.
    fn reclaim(&self, inner: &mut Inner<V>, key: &str) -> Option<Pending<V>> {
        let item = inner.items.remove(key)?;
        if let Some(stats) = inner.stats_mut() {
            stats.record_miss();
            stats.record_expiration();
        }
        inner.sync_count();
        Some(Pending {
            kind: EventKind::Expire,
            item,
        })
    }

    /// Snapshots `item` for `kind` if a handler wants it.
    fn pending(&self, kind: EventKind, item: &CacheItem<V>) -> Option<Pending<V>> {
        self.events.has_handler(kind).then(|| Pending {
            kind,
            item: item.clone(),
        })
    }

    fn fire(&self, pending: Option<Pending<V>>) {
        if let Some(Pending { kind, item }) = pending {
            self.events.dispatch(kind, &item);
        }
    }
}

impl<V: Clone> Default for NearCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread::sleep;

    const LONG: Duration = Duration::from_secs(60);
    const SHORT: Duration = Duration::from_millis(50);

    fn counting(
        hits: &Arc<AtomicUsize>,
    ) -> impl Fn(&CacheItem<String>) -> anyhow::Result<()> + Send + Sync + 'static {
        let hits = hits.clone();
        move |_: &CacheItem<String>| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_store_new() {
        let cache: NearCache<String> = NearCache::new();
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.statistics(), Some(CacheStats::new()));
    }

    #[test]
    fn test_store_add_and_get() {
        let cache = NearCache::new();

        cache.add("key1", "value1".to_string(), LONG).unwrap();
        let item = cache.get("key1").unwrap();

        assert_eq!(item.value, "value1");
        assert_eq!(item.ttl(), LONG);
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let cache: NearCache<String> = NearCache::new();

        let result = cache.get("nonexistent");
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_overwrite() {
        let cache = NearCache::new();

        cache.add("key1", "value1".to_string(), LONG).unwrap();
        cache.add("key1", "value2".to_string(), LONG).unwrap();

        assert_eq!(cache.get("key1").unwrap().value, "value2");
        assert_eq!(cache.count(), 1);
        assert_eq!(cache.statistics().unwrap().additions, 2);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let cache = NearCache::new();

        cache.add("key1", "value1".to_string(), SHORT).unwrap();
        assert!(cache.get("key1").is_ok());

        sleep(SHORT * 2);

        assert!(matches!(cache.get("key1"), Err(CacheError::Expired(_))));
        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_store_insert_uses_default_ttl() {
        let config = Config::default().with_default_ttl(Duration::from_secs(7));
        let cache = NearCache::with_config(config, EventConfig::new());

        cache.insert("k", 1u32).unwrap();
        assert_eq!(cache.get("k").unwrap().ttl(), Duration::from_secs(7));
    }

    #[test]
    fn test_store_delete() {
        let cache = NearCache::new();

        cache.add("key1", "value1".to_string(), LONG).unwrap();
        cache.del("key1").unwrap();

        assert_eq!(cache.count(), 0);
        assert!(matches!(cache.get("key1"), Err(CacheError::NotFound(_))));
        assert!(matches!(cache.del("key1"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_get_and_expire() {
        let cache = NearCache::new();
        cache.add("key1", "value1".to_string(), LONG).unwrap();

        let item = cache.get_and_expire("key1").unwrap();
        assert_eq!(item.value, "value1");
        assert!(!cache.has("key1"));
        assert!(matches!(
            cache.get_and_expire("key1"),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_get_and_expire_on_stale_item() {
        let cache = NearCache::new();
        cache.add("key1", "value1".to_string(), SHORT).unwrap();

        sleep(SHORT * 2);

        assert!(matches!(
            cache.get_and_expire("key1"),
            Err(CacheError::NotFound(_))
        ));
        assert!(!cache.has("key1"));
        assert_eq!(cache.statistics().unwrap().expirations, 1);
    }

    #[test]
    fn test_store_refresh() {
        let cache = NearCache::new();
        cache.add("key1", "value1".to_string(), LONG).unwrap();
        let before = cache.get("key1").unwrap().expire_at().unwrap();

        sleep(Duration::from_millis(10));
        let refreshed = cache.refresh("key1").unwrap();

        assert!(refreshed.expire_at().unwrap() > before);
        assert_eq!(refreshed.ttl(), LONG);
        assert!(matches!(cache.refresh("missing"), Err(CacheError::NotFound(_))));
        assert!(matches!(
            cache.get_and_refresh("missing"),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_refresh_revives_unreclaimed_item() {
        let cache = NearCache::new();
        cache.add("key1", "value1".to_string(), SHORT).unwrap();

        sleep(SHORT * 2);
        assert!(cache.expired("key1").unwrap());

        cache.get_and_refresh("key1").unwrap();
        assert!(!cache.expired("key1").unwrap());
        assert_eq!(cache.get("key1").unwrap().value, "value1");
    }

    #[test]
    fn test_store_update() {
        let cache = NearCache::new();
        cache.add("key1", "a".to_string(), LONG).unwrap();

        let updated = cache.update("key1", "b".to_string()).unwrap();
        assert_eq!(updated.value, "b");
        assert_eq!(updated.ttl(), LONG);
        assert_eq!(cache.get("key1").unwrap().value, "b");
        assert!(matches!(
            cache.update("missing", "c".to_string()),
            Err(CacheError::NotFound(_))
        ));
    }

    #[test]
    fn test_store_has_ignores_expiration() {
        let cache = NearCache::new();
        cache.add("key1", "value1".to_string(), SHORT).unwrap();

        sleep(SHORT * 2);

        // Presence only, the item is still stored until touched
        assert!(cache.has("key1"));
        assert!(cache.expired("key1").unwrap());
        assert!(cache.has("key1"));

        assert!(matches!(cache.get("key1"), Err(CacheError::Expired(_))));
        assert!(!cache.has("key1"));
    }

    #[test]
    fn test_store_expired_missing_key() {
        let cache: NearCache<String> = NearCache::new();
        assert!(matches!(cache.expired("missing"), Err(CacheError::NotFound(_))));
    }

    #[test]
    fn test_store_clean() {
        let cache = NearCache::new();
        for i in 0..5 {
            cache.add(format!("key{i}"), i, LONG).unwrap();
        }
        assert_eq!(cache.count(), 5);

        cache.clean();

        assert_eq!(cache.count(), 0);
        assert_eq!(cache.statistics().unwrap().items, 0);
        for i in 0..5 {
            assert!(matches!(
                cache.get(&format!("key{i}")),
                Err(CacheError::NotFound(_))
            ));
        }
    }

    #[test]
    fn test_store_stats() {
        let cache = NearCache::new();

        cache.add("key1", "value1".to_string(), LONG).unwrap();
        cache.add("key2", "value2".to_string(), SHORT).unwrap();
        cache.get("key1").unwrap(); // call
        let _ = cache.get("nonexistent"); // miss
        sleep(SHORT * 2);
        let _ = cache.get("key2"); // miss + expiration

        let stats = cache.statistics().unwrap();
        assert_eq!(stats.calls, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.additions, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.items, 1);
    }

    #[test]
    fn test_store_stats_disabled() {
        let config = Config::default().with_stats(false);
        let cache = NearCache::with_config(config, EventConfig::new());

        cache.add("key1", 1, LONG).unwrap();
        cache.get("key1").unwrap();

        assert!(cache.statistics().is_none());
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_store_events_fire_once_per_operation() {
        let adds = Arc::new(AtomicUsize::new(0));
        let deletes = Arc::new(AtomicUsize::new(0));
        let updates = Arc::new(AtomicUsize::new(0));
        let refreshes = Arc::new(AtomicUsize::new(0));
        let expires = Arc::new(AtomicUsize::new(0));

        let events = EventConfig::new()
            .on_add(counting(&adds))
            .on_delete(counting(&deletes))
            .on_update(counting(&updates))
            .on_refresh(counting(&refreshes))
            .on_expire(counting(&expires));
        let cache = NearCache::with_events(events);

        cache.add("a", "1".to_string(), LONG).unwrap();
        cache.update("a", "2".to_string()).unwrap();
        cache.refresh("a").unwrap();
        cache.get("a").unwrap();
        cache.del("a").unwrap();

        cache.add("b", "1".to_string(), SHORT).unwrap();
        sleep(SHORT * 2);
        let _ = cache.get("b");

        // Failed operations fire nothing
        let _ = cache.del("a");
        let _ = cache.update("a", "3".to_string());
        let _ = cache.refresh("a");

        assert_eq!(adds.load(Ordering::SeqCst), 2);
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        assert_eq!(expires.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_store_clean_fires_no_events() {
        let deletes = Arc::new(AtomicUsize::new(0));
        let cache = NearCache::with_events(EventConfig::new().on_delete(counting(&deletes)));

        cache.add("a", "1".to_string(), LONG).unwrap();
        cache.clean();

        assert_eq!(deletes.load(Ordering::SeqCst), 0);
    }
}
