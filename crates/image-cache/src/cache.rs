//! Cache lookup and fetch-and-store over a key-value store

use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::error::{CacheError, FetchError};
use crate::fetcher::ImageFetcher;
use crate::types::{CacheConfig, CacheEntry, CacheStats};
use futures::future::{BoxFuture, FutureExt, Shared};
use kv_store::KeyValueStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

type SharedFetch = Shared<BoxFuture<'static, Result<String, FetchError>>>;

/// Image cache backed by a [`KeyValueStore`].
///
/// Cheap to clone; clones share the store, fetcher and counters.
#[derive(Clone)]
pub struct CacheManager {
    inner: Arc<Inner>,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn ImageFetcher>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    /// Fetches in progress, only used when `dedupe_fetches` is set
    in_flight: Mutex<HashMap<String, SharedFetch>>,
    hits: AtomicU64,
    misses: AtomicU64,
    fetches: AtomicU64,
    stores: AtomicU64,
    store_failures: AtomicU64,
    evictions: AtomicU64,
}

impl CacheManager {
    /// Create a manager using the system clock
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn ImageFetcher>,
        config: CacheConfig,
    ) -> Self {
        Self::with_clock(store, fetcher, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn ImageFetcher>,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                clock,
                config,
                in_flight: Mutex::new(HashMap::new()),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                fetches: AtomicU64::new(0),
                stores: AtomicU64::new(0),
                store_failures: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Store key for a source URL
    pub fn key_for(&self, url: &str) -> String {
        codec::cache_key(&self.inner.config.key_prefix, url)
    }

    /// Return the cached data URI for `url` if present and fresh.
    ///
    /// Expired and undecodable entries are deleted. Storage errors are
    /// logged and reported as a miss.
    pub async fn lookup(&self, url: &str) -> Option<String> {
        match self.try_lookup(url).await {
            Ok(Some(data)) => {
                self.inner.hits.fetch_add(1, Ordering::Relaxed);
                debug!(url, "Image cache hit");
                Some(data)
            }
            Ok(None) => {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(url, error = %e, "Error reading from image cache");
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn try_lookup(&self, url: &str) -> Result<Option<String>, CacheError> {
        let key = self.key_for(url);

        let Some(raw) = self.inner.store.get(&key).await.map_err(CacheError::Read)? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.evict(&key).await;
                return Err(e.into());
            }
        };

        let now = self.inner.clock.now_millis();
        if !entry.is_fresh(now, self.inner.config.ttl) {
            debug!(
                url,
                age_ms = now - entry.timestamp,
                "Image cache entry expired"
            );
            self.evict(&key).await;
            return Ok(None);
        }

        Ok(Some(entry.data))
    }

    async fn evict(&self, key: &str) {
        match self.inner.store.delete(key).await {
            Ok(()) => {
                self.inner.evictions.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(key, error = %e, "Failed to delete image cache entry"),
        }
    }

    /// Fetch `url`, cache it as a data URI and return the data URI.
    ///
    /// A failed cache write does not fail the call.
    pub async fn fetch_and_store(&self, url: &str) -> Result<String, FetchError> {
        self.inner.fetches.fetch_add(1, Ordering::Relaxed);

        let image = self.inner.fetcher.fetch(url).await?;
        let entry = CacheEntry {
            data: codec::encode_data_uri(&image.content_type, &image.bytes),
            timestamp: self.inner.clock.now_millis(),
        };

        match self.store_entry(url, &entry).await {
            Ok(()) => {
                self.inner.stores.fetch_add(1, Ordering::Relaxed);
                debug!(url, size = image.bytes.len(), "Cached image");
            }
            Err(e) => {
                self.inner.store_failures.fetch_add(1, Ordering::Relaxed);
                warn!(url, error = %e, "Error saving to image cache");
            }
        }

        Ok(entry.data)
    }

    async fn store_entry(&self, url: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let raw = serde_json::to_string(entry)?;
        self.inner
            .store
            .set(&self.key_for(url), &raw)
            .await
            .map_err(CacheError::Write)
    }

    /// Cache lookup, falling back to fetch-and-store on a miss
    pub async fn load(&self, url: &str) -> Result<String, FetchError> {
        if let Some(data) = self.lookup(url).await {
            return Ok(data);
        }

        if self.inner.config.dedupe_fetches {
            self.fetch_shared(url).await
        } else {
            self.fetch_and_store(url).await
        }
    }

    /// Join an in-flight fetch for `url`, or start one others can join
    async fn fetch_shared(&self, url: &str) -> Result<String, FetchError> {
        let fetch = {
            let mut in_flight = self.inner.in_flight.lock().await;
            match in_flight.get(url) {
                Some(existing) => {
                    debug!(url, "Joining in-flight image fetch");
                    existing.clone()
                }
                None => {
                    let manager = self.clone();
                    let owned = url.to_string();
                    let fetch = async move {
                        let result = manager.fetch_and_store(&owned).await;
                        manager.inner.in_flight.lock().await.remove(&owned);
                        result
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(url.to_string(), fetch.clone());
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            fetches: self.inner.fetches.load(Ordering::Relaxed),
            stores: self.inner.stores.load(Ordering::Relaxed),
            store_failures: self.inner.store_failures.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }
}
