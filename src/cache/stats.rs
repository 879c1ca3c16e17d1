//! Cache Statistics Module
//!
//! Tracks usage counters: calls, misses, additions and expirations.

use serde::Serialize;

// == Cache Stats ==
/// Usage counters maintained alongside the item map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful retrievals
    pub calls: u64,
    /// Number of failed retrievals (key not found or expired)
    pub misses: u64,
    /// Number of items added (overwrites included)
    pub additions: u64,
    /// Number of items reclaimed because their TTL elapsed
    pub expirations: u64,
    /// Current number of items in the cache
    pub items: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns calls / (calls + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.calls + self.misses;
        if total == 0 {
            0.0
        } else {
            self.calls as f64 / total as f64
        }
    }

    pub(crate) fn record_call(&mut self) {
        self.calls += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_addition(&mut self) {
        self.additions += 1;
    }

    pub(crate) fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub(crate) fn set_items(&mut self, count: usize) {
        self.items = count;
    }
}
