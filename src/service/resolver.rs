//! Resolution Service
//!
//! The single entry point used by proxy connections, the operator console and
//! the admin API. Resolving a key runs:
//!
//! `LOOKUP -> {HIT_FRESH, MISS_OR_STALE} -> FETCH -> {ADMIT, REJECT_*} -> DONE`
//!
//! Stale entries are never evicted on this path; they stay visible until a
//! sweep, an operator command or a successful refetch replaces them.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, EntrySummary, SharedStore, StatsSnapshot};
use crate::error::{ProxyError, Result};
use crate::upstream::Fetcher;

// == Outcome ==
/// How a successful resolution was served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Served from a fresh cache entry, no upstream contact
    Hit,
    /// Fetched upstream and admitted into the cache
    Cached,
    /// Fetched upstream but refused by size admission
    NotCached { reason: String },
}

/// Payload returned by [`ResolutionService::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub payload: Bytes,
    pub outcome: Outcome,
}

/// Counters plus occupancy figures, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub total_entries: usize,
    pub total_bytes: u64,
    pub max_total_bytes: u64,
    pub ttl_ms: u64,
}

// == Resolution Service ==
/// Orchestrates lookup, fetch-on-miss and admission over a shared store.
#[derive(Clone)]
pub struct ResolutionService {
    store: SharedStore,
    fetcher: Arc<dyn Fetcher>,
}

impl ResolutionService {
    pub fn new(store: SharedStore, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// The store this service resolves against.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    // == Resolve ==
    /// Returns the payload for `key`, from cache when fresh, else from upstream.
    ///
    /// Upstream `NotFound` and `Transport` failures fail the resolution and
    /// leave any stale entry in place. A payload the cache refuses to admit is
    /// still returned, with [`Outcome::NotCached`]. Dropping the returned
    /// future does not cancel an upstream fetch that has already started.
    pub async fn resolve(&self, key: &str) -> Result<Resolution> {
        let now = current_timestamp_ms();
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if store.is_fresh(&entry, now) => {
                    store.stats().record_hit();
                    debug!("Cache hit for '{}' ({} bytes)", key, entry.size());
                    return Ok(Resolution {
                        payload: entry.payload,
                        outcome: Outcome::Hit,
                    });
                }
                Some(_) => debug!("Cache entry for '{}' is stale, refetching", key),
                None => debug!("Cache miss for '{}'", key),
            }
            store.stats().record_miss();
        }

        // The fetch and admission run in their own task so that a caller
        // going away mid-fetch still leaves the result in the cache.
        let fetch = tokio::spawn(fetch_and_admit(
            self.store.clone(),
            self.fetcher.clone(),
            key.to_string(),
        ));
        fetch.await.map_err(|e| {
            warn!("Fetch task for '{}' did not complete: {}", key, e);
            ProxyError::Transport(format!("fetch task for '{}' failed: {}", key, e))
        })?
    }

    // == Remove ==
    /// Drops one entry; fails with `UnknownKey` when it is not cached.
    pub async fn remove(&self, key: &str) -> Result<()> {
        if self.store.write().await.remove(key) {
            info!("Removed '{}' from cache", key);
            Ok(())
        } else {
            Err(ProxyError::UnknownKey(key.to_string()))
        }
    }

    // == Clear ==
    /// Drops every entry; returns how many were removed.
    pub async fn clear(&self) -> usize {
        let removed = self.store.write().await.clear();
        info!("Cache cleared ({} entries removed)", removed);
        removed
    }

    // == Show ==
    pub async fn show(&self) -> Vec<EntrySummary> {
        self.store.read().await.snapshot()
    }

    // == Set Expiration ==
    /// Replaces the global TTL; existing timestamps are kept.
    pub async fn set_expiration(&self, ttl: Duration) {
        self.store.write().await.set_ttl(ttl);
        info!("Global expiration set to {} ms", ttl.as_millis());
    }

    // == Set Expiration File ==
    /// Restarts the freshness window of one entry at the current time.
    ///
    /// There is no per-key TTL: the requested duration is only logged, the
    /// entry keeps expiring under the global TTL counted from now.
    pub async fn set_expiration_file(&self, key: &str, requested: Duration) -> Result<()> {
        if self.store.write().await.touch(key) {
            info!(
                "Expiration window for '{}' restarted (requested {} ms, global TTL applies)",
                key,
                requested.as_millis()
            );
            Ok(())
        } else {
            Err(ProxyError::UnknownKey(key.to_string()))
        }
    }

    // == Stats ==
    pub async fn report(&self) -> CacheReport {
        let store = self.store.read().await;
        CacheReport {
            stats: store.stats().snapshot(),
            total_entries: store.len(),
            total_bytes: store.total_bytes(),
            max_total_bytes: store.max_total_bytes(),
            ttl_ms: store.current_ttl().as_millis() as u64,
        }
    }
}

/// Fetches `key` upstream and offers the payload to the store.
async fn fetch_and_admit(
    store: SharedStore,
    fetcher: Arc<dyn Fetcher>,
    key: String,
) -> Result<Resolution> {
    let payload = fetcher.fetch(&key).await.map_err(|e| {
        warn!("Upstream fetch for '{}' failed: {}", key, e);
        e
    })?;

    let admission = store.write().await.put(key.clone(), payload.clone());

    let outcome = match admission {
        Ok(()) => {
            info!("Stored '{}' in cache ({} bytes)", key, payload.len());
            Outcome::Cached
        }
        Err(e) if e.is_admission() => {
            warn!("Serving '{}' without caching: {}", key, e);
            Outcome::NotCached {
                reason: e.to_string(),
            }
        }
        Err(e) => return Err(e),
    };

    Ok(Resolution { payload, outcome })
}
