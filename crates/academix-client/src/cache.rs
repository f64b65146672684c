//! Time-bounded response cache
//!
//! Stores the last successful payload per request key. An entry is valid
//! only while `now - created_at < ttl`; stale entries are never returned and
//! are evicted on the read that finds them. There is no size bound; callers
//! that keep a client alive for a long time can run [`ResponseCache::purge_expired`]
//! themselves.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use academix_core::ports::Clock;

use crate::request_key::RequestKey;

/// A cached payload and its creation time
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    created_at: DateTime<Utc>,
}

/// TTL-bounded store of {request key → last successful payload}
pub struct ResponseCache {
    entries: DashMap<RequestKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Creates a cache with the given TTL
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Returns the cached payload for `key` if it is still fresh.
    ///
    /// A stale entry is evicted and `None` is returned.
    pub fn get(&self, key: &RequestKey) -> Option<Value> {
        let now = self.clock.now();

        let fresh = match self.entries.get(key) {
            Some(entry) => {
                if now - entry.created_at < self.ttl {
                    return Some(entry.payload.clone());
                }
                false
            }
            None => return None,
        };

        if !fresh {
            debug!(key = %key, "Evicting stale cache entry");
            self.entries.remove(key);
        }
        None
    }

    /// Unconditionally stores `payload` under `key` with a fresh timestamp
    pub fn set(&self, key: &RequestKey, payload: Value) {
        debug!(key = %key, "Caching response payload");
        self.entries.insert(
            key.clone(),
            CacheEntry {
                payload,
                created_at: self.clock.now(),
            },
        );
    }

    /// Removes every entry whose TTL has elapsed, returning how many were
    /// evicted. Not scheduled internally.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now - entry.created_at < self.ttl);
        before - self.entries.len()
    }

    /// Number of entries currently held, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
