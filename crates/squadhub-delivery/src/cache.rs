//! Key/value cache with per-entry expiry.
//!
//! Expiry is computed against the injected [`Clock`], so tests exercise
//! expiration by advancing virtual time instead of sleeping.

use std::hash::Hash;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use squadhub_core::traits::clock::Clock;

/// An in-memory cache where every entry expires `ttl` after insertion.
pub struct TtlCache<K, V> {
    entries: DashMap<K, (V, DateTime<Utc>)>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the given time-to-live.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Get a live value. Expired entries are evicted on access.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let live = self
            .entries
            .get(key)
            .and_then(|entry| (entry.value().1 > now).then(|| entry.value().0.clone()));

        if live.is_none() {
            self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        }
        live
    }

    /// Insert a value, resetting its expiry.
    pub fn insert(&self, key: K, value: V) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(key, (value, expires_at));
    }

    /// Remove one entry.
    pub fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Number of entries, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("ttl_seconds", &self.ttl.num_seconds())
            .finish()
    }
}
