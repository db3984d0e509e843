//! Expiration Reaper
//!
//! Background task that periodically sweeps expired entries from the cache.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_ms, SharedStore};

/// Default interval between sweeps.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(60);

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// Each sweep runs in its own task so that a panic inside one pass is
/// logged and the loop carries on with the next tick. The loop only ends
/// when the returned handle is aborted.
///
/// # Example
/// ```ignore
/// let store = CacheStore::new(10 * 1024 * 1024, Duration::from_secs(60)).shared();
/// let reaper = spawn_reaper(store.clone(), DEFAULT_REAPER_INTERVAL);
/// // Later, during shutdown:
/// reaper.abort();
/// ```
pub fn spawn_reaper(store: SharedStore, interval: Duration) -> JoinHandle<()> {
    spawn_sweep_loop(interval, move || {
        let store = store.clone();
        async move {
            let mut guard = store.write().await;
            guard.sweep_expired(current_timestamp_ms())
        }
    })
}

/// Runs `sweep` once per tick, each pass in its own task.
fn spawn_sweep_loop<F, Fut>(interval: Duration, sweep: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = usize> + Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting expiration reaper with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        // The first tick completes immediately; sweeps start one interval in.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match tokio::spawn(sweep()).await {
                Ok(0) => debug!("Reaper: no expired entries found"),
                Ok(removed) => info!("Reaper: removed {} expired entries", removed),
                Err(e) => warn!("Reaper: sweep failed, retrying next tick: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reaper_removes_expired_entries() {
        let store = CacheStore::new(100, Duration::from_millis(50)).shared();
        store
            .write()
            .await
            .put("expire_soon".to_string(), Bytes::from_static(b"value"))
            .unwrap();

        let handle = spawn_reaper(store.clone(), Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(400)).await;

        {
            let guard = store.read().await;
            assert!(guard.get("expire_soon").is_none(), "Expired entry should have been swept");
            assert_eq!(guard.total_bytes(), 0);
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_preserves_fresh_entries() {
        let store = CacheStore::new(100, Duration::from_secs(3600)).shared();
        store
            .write()
            .await
            .put("long_lived".to_string(), Bytes::from_static(b"value"))
            .unwrap();

        let handle = spawn_reaper(store.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(300)).await;

        {
            let guard = store.read().await;
            let entry = guard.get("long_lived").expect("Fresh entry should not be removed");
            assert_eq!(entry.payload.as_ref(), b"value");
        }

        handle.abort();
    }

    #[tokio::test]
    async fn test_reaper_can_be_aborted() {
        let store = CacheStore::new(100, Duration::from_secs(1)).shared();

        let handle = spawn_reaper(store, Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }

    #[tokio::test]
    async fn test_panicking_sweep_does_not_stop_reaper() {
        let store = CacheStore::new(100, Duration::from_millis(10)).shared();
        store
            .write()
            .await
            .put_at("old".to_string(), Bytes::from_static(b"value"), 0)
            .unwrap();

        let passes = Arc::new(AtomicUsize::new(0));
        let counter = passes.clone();
        let swept_store = store.clone();
        let handle = spawn_sweep_loop(Duration::from_millis(50), move || {
            let pass = counter.fetch_add(1, Ordering::SeqCst);
            let store = swept_store.clone();
            async move {
                if pass == 0 {
                    panic!("first sweep fails");
                }
                store.write().await.sweep_expired(current_timestamp_ms())
            }
        });

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(passes.load(Ordering::SeqCst) >= 2, "later ticks should still sweep");
        assert!(!handle.is_finished(), "reaper loop should still be running");
        assert!(store.read().await.is_empty());

        handle.abort();
    }
}
