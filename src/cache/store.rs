//! TTL Cache Store Module
//!
//! HashMap storage with per-entry expiry, evicted lazily on read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, MAX_KEY_LENGTH};
use crate::error::{Result, SearchError};

// == TTL Cache ==
/// Key-value store where every entry carries its own expiry.
///
/// Stale entries are only dropped when they are read again, or when the owner
/// calls [`TtlCache::cleanup_expired`]. Keys that expire and are never read
/// again stay in memory until one of those happens.
#[derive(Debug)]
pub struct TtlCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Performance statistics
    stats: CacheStats,
    /// Time source for expiry checks
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TtlCache<T> {
    // == Constructor ==
    /// Creates an empty cache on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            clock,
        }
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Overwriting an existing key replaces the value and resets its expiry.
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Duration) -> Result<()> {
        let key = key.into();
        if key.len() > MAX_KEY_LENGTH {
            return Err(SearchError::InvalidRequest(format!(
                "Cache key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let entry = CacheEntry::new(value, ttl, self.clock.now_ms());
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());

        Ok(())
    }

    // == Get ==
    /// Returns the value if present and not yet expired.
    ///
    /// A stale entry is removed by this call and counted as a miss.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let data = entry.data.clone();
                self.stats.record_hit();
                Some(data)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_expirations(1);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Remove ==
    /// Removes an entry by key. Returns true if something was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let count = before - self.entries.len();
        self.stats.record_expirations(count);
        self.stats.set_total_entries(self.entries.len());
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
