//! Versioned, TTL-bound response cache over a [`CacheStore`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};
use super::store::CacheStore;
use crate::telemetry;

/// Persisted form of a cached value.
///
/// Serialized as `{"url": ..., "timestamp": <epoch ms>, "version": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(rename = "url")]
    pub value: String,
    /// Creation time in epoch milliseconds.
    #[serde(rename = "timestamp")]
    pub created_at: i64,
    pub version: String,
}

/// Best-effort durable cache of previously resolved values.
///
/// An entry is only returned when its version equals the cache's expected
/// version and it is younger than the TTL. Anything else (stale, wrong
/// version, unreadable) is evicted and reported as a miss. Storage errors
/// never reach the caller.
pub struct LocalResponseCache {
    store: Arc<dyn CacheStore>,
    version: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl LocalResponseCache {
    /// Create a cache over `store` using the system clock.
    pub fn new(store: Arc<dyn CacheStore>, version: impl Into<String>, ttl: Duration) -> Self {
        Self::with_clock(store, version, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn CacheStore>,
        version: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            version: version.into(),
            ttl,
            clock,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `key` if it is current.
    pub fn read(&self, key: &str) -> Option<String> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.miss(),
            Err(e) => {
                warn!(store = self.store.name(), key, error = %e, "cache read failed");
                return self.miss();
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "corrupt cache entry");
                self.evict(key, "corrupt");
                return self.miss();
            }
        };

        if entry.version != self.version {
            debug!(key, found = %entry.version, expected = %self.version, "cache version mismatch");
            self.evict(key, "version");
            return self.miss();
        }

        let age = self.clock.now_millis().saturating_sub(entry.created_at);
        if age >= self.ttl_millis() {
            debug!(key, age_ms = age, "cache entry expired");
            self.evict(key, "expired");
            return self.miss();
        }

        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        Some(entry.value)
    }

    /// Store `value` under `key`, stamped with the current time and version.
    pub fn write(&self, key: &str, value: &str) {
        let entry = CacheEntry {
            value: value.to_string(),
            created_at: self.clock.now_millis(),
            version: self.version.clone(),
        };
        let result = serde_json::to_string(&entry)
            .map_err(crate::FitgenError::from)
            .and_then(|raw| self.store.put(key, &raw));
        if let Err(e) = result {
            warn!(store = self.store.name(), key, error = %e, "cache write failed");
        }
    }

    /// Remove `key` regardless of its state.
    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(store = self.store.name(), key, error = %e, "cache invalidate failed");
        }
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    fn evict(&self, key: &str, reason: &'static str) {
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => reason).increment(1);
        self.invalidate(key);
    }

    fn miss(&self) -> Option<String> {
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        None
    }
}
