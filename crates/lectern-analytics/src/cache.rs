//! Bounded, time-expiring store for analysis outputs.
//!
//! Entries live for a fixed TTL from insertion and are evicted least recently
//! used when the cache is full. Expiry is lazy: an expired entry is dropped
//! when a lookup finds it, or when an insert needs room.
//!
//! The cache is process local. Each worker owns its own instance; nothing is
//! persisted or shared across processes.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::AnalyticsConfig;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: JsonValue,
    inserted_at: Instant,
}

/// Shared results cache. Clones share the same storage.
#[derive(Clone)]
pub struct ResultsCache {
    entries: Arc<Mutex<LruCache<String, CacheEntry>>>,
    ttl: Duration,
}

impl ResultsCache {
    pub fn new(ttl: Duration, max_size: NonZeroUsize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(max_size))),
            ttl,
        }
    }

    pub fn from_config(config: &AnalyticsConfig) -> Self {
        Self::new(config.cache_ttl, config.cache_max_size)
    }

    /// Cached value for `key`, or `None` when absent or expired.
    ///
    /// A hit marks the entry as most recently used.
    pub async fn find(&self, key: &str) -> Option<JsonValue> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            None => {
                debug!(cache_key = key, "Results cache miss");
                return None;
            }
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                debug!(cache_key = key, "Results cache hit");
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }
        entries.pop(key);
        debug!(cache_key = key, "Results cache entry expired");
        None
    }

    /// Store `value` under `key`, replacing any previous value and restarting
    /// its TTL. When full, expired entries are dropped first, then the least
    /// recently used one.
    pub async fn add(&self, key: impl Into<String>, value: JsonValue) {
        let key = key.into();
        let mut entries = self.entries.lock().await;

        if !entries.contains(&key) && entries.len() == entries.cap().get() {
            let ttl = self.ttl;
            let stale: Vec<String> = entries
                .iter()
                .filter(|(_, e)| e.inserted_at.elapsed() >= ttl)
                .map(|(k, _)| k.clone())
                .collect();
            for k in &stale {
                entries.pop(k);
            }
            trace!(purged = stale.len(), "Purged expired cache entries");
        }

        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
        };
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                debug!(cache_key = %evicted, "Evicted least recently used cache entry");
            }
        }
        debug!(cache_key = %key, cache_size = entries.len(), "Cached analysis output");
    }

    /// Number of entries held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
