//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL in seconds for items inserted without an explicit TTL.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Cache configuration parameters.
///
/// Lifecycle callbacks live in [`EventConfig`](crate::cache::EventConfig),
/// since they are tied to the cached value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TTL used by [`NearCache::insert`](crate::cache::NearCache::insert)
    pub default_ttl: Duration,
    /// Whether usage counters are maintained
    pub track_stats: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `NEAR_CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `NEAR_CACHE_TRACK_STATS` - `true`/`false`/`1`/`0` (default: true)
    pub fn from_env() -> Self {
        Self {
            default_ttl: env::var("NEAR_CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS)),
            track_stats: env::var("NEAR_CACHE_TRACK_STATS")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
        }
    }

    /// Sets the default TTL.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Enables or disables usage counters.
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            track_stats: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
