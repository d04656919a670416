//! Core types for the image cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::codec::DEFAULT_KEY_PREFIX;

/// Freshness window for cached images
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A cached image as persisted in the key-value store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Self-contained data URI
    pub data: String,
    /// Unix millis when the entry was stored
    pub timestamp: i64,
}

impl CacheEntry {
    /// Whether the entry is still inside the freshness window at `now`
    pub fn is_fresh(&self, now: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Counters kept by the cache manager
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Network fetches issued
    pub fetches: u64,
    /// Entries successfully written
    pub stores: u64,
    /// Writes that failed and were swallowed
    pub store_failures: u64,
    /// Expired or undecodable entries removed on read
    pub evictions: u64,
}

/// Cache manager settings
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Namespace prepended to every store key
    pub key_prefix: String,
    pub ttl: Duration,
    /// Share one in-flight fetch between concurrent loads of the same URL
    pub dedupe_fetches: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: DEFAULT_TTL,
            dedupe_fetches: false,
        }
    }
}

/// What one display instance wants to show
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub fallback_url: Option<String>,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fallback_url: None,
        }
    }

    pub fn with_fallback(mut self, fallback_url: impl Into<String>) -> Self {
        self.fallback_url = Some(fallback_url.into());
        self
    }

    /// The fallback URL, treating an empty string as absent
    pub fn fallback(&self) -> Option<&str> {
        self.fallback_url.as_deref().filter(|url| !url.is_empty())
    }
}
