//! Cache Store Module
//!
//! Size-bounded payload storage with a single global TTL.
//!
//! The store is a plain struct; callers share it as [`SharedStore`] so that
//! every mutation runs under the write lock and lookups under the read lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats};
use crate::error::{ProxyError, Result};

/// Store handle shared by the resolver, the reaper and the admin surfaces.
pub type SharedStore = Arc<RwLock<CacheStore>>;

// == Entry Summary ==
/// Diagnostic view of one entry, without its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub key: String,
    pub size: u64,
    pub stored_at: u64,
    /// Whether the entry was within the TTL when the snapshot was taken
    pub fresh: bool,
}

// == Cache Store ==
/// Payload cache bounded by the total number of bytes it holds.
#[derive(Debug)]
pub struct CacheStore {
    /// Key to entry storage
    entries: HashMap<String, CacheEntry>,
    /// Sum of all payload lengths currently stored
    total_bytes: u64,
    /// Cap on `total_bytes`
    max_total_bytes: u64,
    /// Global expiration in milliseconds
    ttl_ms: u64,
    /// Activity counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_total_bytes` - Cap on the sum of all payload lengths
    /// * `ttl` - Global expiration applied to every entry
    pub fn new(max_total_bytes: u64, ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            total_bytes: 0,
            max_total_bytes,
            ttl_ms: ttl.as_millis() as u64,
            stats: CacheStats::new(),
        }
    }

    /// Wraps the store for sharing across tasks.
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // == Get ==
    /// Returns the entry for `key`, fresh or not.
    ///
    /// Freshness is the caller's decision; see [`CacheStore::is_fresh`].
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).cloned()
    }

    /// Checks an entry against the current TTL.
    pub fn is_fresh(&self, entry: &CacheEntry, now: u64) -> bool {
        entry.is_fresh(now, self.ttl_ms)
    }

    // == Put ==
    /// Stores `payload` under `key`, stamped with the current time.
    ///
    /// A previous entry for `key` does not count against the budget. On
    /// rejection the store is left untouched.
    pub fn put(&mut self, key: String, payload: Bytes) -> Result<()> {
        self.put_at(key, payload, current_timestamp_ms())
    }

    /// Same as [`CacheStore::put`] with an explicit timestamp.
    pub fn put_at(&mut self, key: String, payload: Bytes, now: u64) -> Result<()> {
        let size = payload.len() as u64;

        if size > self.max_total_bytes {
            self.stats.record_rejection();
            return Err(ProxyError::TooLarge {
                key,
                size,
                max: self.max_total_bytes,
            });
        }

        let replaced = self.entries.get(&key).map_or(0, CacheEntry::size);
        let occupied = self.total_bytes - replaced;
        let available = self.max_total_bytes - occupied;

        if size > available {
            self.stats.record_rejection();
            return Err(ProxyError::CapacityExceeded {
                key,
                size,
                available,
            });
        }

        self.entries
            .insert(key.clone(), CacheEntry::at(key, payload, now));
        self.total_bytes = occupied + size;
        self.stats.record_admission();

        Ok(())
    }

    // == Remove ==
    /// Deletes the entry for `key`; returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.total_bytes -= entry.size();
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Removes every entry; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.total_bytes = 0;
        count
    }

    // == TTL ==
    /// Replaces the global TTL without touching any `stored_at`.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl_ms = ttl.as_millis() as u64;
    }

    pub fn current_ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    // == Touch ==
    /// Resets the freshness window of one entry to start now.
    pub fn touch(&mut self, key: &str) -> bool {
        self.touch_at(key, current_timestamp_ms())
    }

    pub fn touch_at(&mut self, key: &str, now: u64) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stored_at = now;
                true
            }
            None => false,
        }
    }

    // == Snapshot ==
    /// Lists every entry, stale ones included, ordered by key.
    pub fn snapshot(&self) -> Vec<EntrySummary> {
        self.snapshot_at(current_timestamp_ms())
    }

    pub fn snapshot_at(&self, now: u64) -> Vec<EntrySummary> {
        let mut summaries: Vec<EntrySummary> = self
            .entries
            .values()
            .map(|entry| EntrySummary {
                key: entry.key.clone(),
                size: entry.size(),
                stored_at: entry.stored_at,
                fresh: entry.is_fresh(now, self.ttl_ms),
            })
            .collect();
        summaries.sort_by(|a, b| a.key.cmp(&b.key));
        summaries
    }

    // == Sweep Expired ==
    /// Removes every entry older than the current TTL at `now`.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let ttl_ms = self.ttl_ms;
        let before = self.entries.len();
        let mut freed = 0;

        self.entries.retain(|_, entry| {
            let keep = entry.is_fresh(now, ttl_ms);
            if !keep {
                freed += entry.size();
            }
            keep
        });

        self.total_bytes -= freed;
        let removed = before - self.entries.len();
        self.stats.record_swept(removed);
        removed
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all payload lengths.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_bytes
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
