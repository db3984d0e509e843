//! Cache Module
//!
//! Provides the size-bounded payload cache with global TTL expiration.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, timestamp_to_utc, CacheEntry};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{CacheStore, EntrySummary, SharedStore};
