//! Cache Item Module
//!
//! Defines the structure for individual cache items with TTL support.

use std::time::{Duration, Instant};

// == Cache Item ==
/// A single cached value with its expiration deadline.
///
/// The original TTL is retained so refresh and update can recompute the
/// deadline relative to the time of the call rather than the insertion time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheItem<V> {
    /// The stored value
    pub value: V,
    /// Expiration deadline, None = TTL beyond the clock's range (never expires)
    expire_at: Option<Instant>,
    /// TTL the item was added with
    ttl: Duration,
}

impl<V> CacheItem<V> {
    // == Constructor ==
    /// Creates a new cache item expiring `ttl` from now.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expire_at: deadline(ttl),
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// An item is expired once the current time is greater than or equal to
    /// its deadline, so a zero TTL is expired immediately.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        match self.expire_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    /// Returns the expiration deadline, or None if the item never expires.
    pub fn expire_at(&self) -> Option<Instant> {
        self.expire_at
    }

    /// Returns the TTL the item was added with.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Time To Live ==
    /// Returns the remaining time to live.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the item has expired
    /// - `Some(remaining)` if the item has not expired yet
    /// - `None` if the item never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expire_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }

    // == Refresh ==
    /// Pushes the deadline to `now + ttl`.
    pub fn refresh(&mut self) {
        self.expire_at = deadline(self.ttl);
    }

    // == Replace ==
    /// Swaps in a new value and refreshes the deadline, returning the old value.
    pub fn replace(&mut self, value: V) -> V {
        self.refresh();
        std::mem::replace(&mut self.value, value)
    }

    /// Consumes the item, returning the stored value.
    pub fn into_value(self) -> V {
        self.value
    }
}

fn deadline(ttl: Duration) -> Option<Instant> {
    Instant::now().checked_add(ttl)
}
