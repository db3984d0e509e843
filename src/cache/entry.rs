//! Cache Entry Module
//!
//! Defines a cached payload and the timestamp its freshness is measured from.

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use chrono::{DateTime, Utc};

// == Cache Entry ==
/// A cached response body plus its insertion or last refresh time.
///
/// The payload is never mutated in place; a refresh replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Resource key the payload was fetched for
    pub key: String,
    /// The cached response body
    pub payload: Bytes,
    /// Insertion or refresh timestamp (Unix milliseconds)
    pub stored_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(key: String, payload: Bytes) -> Self {
        Self::at(key, payload, current_timestamp_ms())
    }

    /// Creates a new entry with an explicit timestamp.
    pub fn at(key: String, payload: Bytes, stored_at: u64) -> Self {
        Self {
            key,
            payload,
            stored_at,
        }
    }

    // == Size ==
    /// Payload length in bytes.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    // == Age ==
    /// Milliseconds elapsed since `stored_at`, saturating at zero.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Is Fresh ==
    /// Checks freshness against a TTL.
    ///
    /// Boundary condition: an entry whose age equals the TTL is still fresh;
    /// it expires once the age strictly exceeds the TTL.
    pub fn is_fresh(&self, now: u64, ttl_ms: u64) -> bool {
        self.age_ms(now) <= ttl_ms
    }

    /// `stored_at` as a UTC datetime, for display.
    pub fn stored_at_utc(&self) -> DateTime<Utc> {
        timestamp_to_utc(self.stored_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts a Unix millisecond timestamp to a UTC datetime.
pub fn timestamp_to_utc(ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_default()
}
