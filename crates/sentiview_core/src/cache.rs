use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::clock::{system_clock, Clock};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// How often a key had been invalidated when a read of it started.
///
/// A fetch that began before an invalidation must not store its answer,
/// see [`TtlCache::set_if_unchanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStamp {
    epoch: u64,
    invalidations: u64,
}

/// Key/value store whose entries read as absent once they reach the TTL.
///
/// Expired entries are not evicted on read; the next `set` for the key
/// replaces them.
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    invalidations: HashMap<String, u64>,
    /// Bumped by `invalidate_all`.
    epoch: u64,
    ttl: Duration,
    clock: Clock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, system_clock())
    }

    pub fn with_clock(ttl: Duration, clock: Clock) -> Self {
        Self {
            entries: HashMap::new(),
            invalidations: HashMap::new(),
            epoch: 0,
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = (self.clock)().saturating_duration_since(entry.stored_at);
        if age >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let stored_at = (self.clock)();
        self.entries
            .insert(key.into(), CacheEntry { value, stored_at });
    }

    pub fn stamp(&self, key: &str) -> CacheStamp {
        CacheStamp {
            epoch: self.epoch,
            invalidations: self.invalidations.get(key).copied().unwrap_or(0),
        }
    }

    /// Store `value` unless `key` was invalidated after `stamp` was taken.
    /// Returns whether the value was stored.
    pub fn set_if_unchanged(&mut self, key: &str, value: V, stamp: CacheStamp) -> bool {
        if self.stamp(key) != stamp {
            return false;
        }
        self.set(key, value);
        true
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
        *self.invalidations.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
        self.invalidations.clear();
        self.epoch += 1;
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
