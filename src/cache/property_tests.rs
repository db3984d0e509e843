//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the size and freshness invariants of the store.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::cache::CacheStore;
use crate::error::ProxyError;

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys shaped like request paths
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,12}(\\.txt|\\.html)?".prop_map(|s| s)
}

fn payload_strategy(max_len: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=max_len).prop_map(Bytes::from)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, payload: Bytes },
    Remove { key: String },
    Touch { key: String },
    Sweep { advance_ms: u64 },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (key_strategy(), payload_strategy(80))
            .prop_map(|(key, payload)| CacheOp::Put { key, payload }),
        2 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Touch { key }),
        1 => (0u64..2_000).prop_map(|advance_ms| CacheOp::Sweep { advance_ms }),
        1 => Just(CacheOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Put followed by Get returns the stored payload when it fits the cap.
    #[test]
    fn prop_put_then_get(key in key_strategy(), payload in payload_strategy(100)) {
        let mut store = CacheStore::new(100, TEST_TTL);

        store.put(key.clone(), payload.clone()).unwrap();

        let entry = store.get(&key).unwrap();
        prop_assert_eq!(entry.payload, payload);
    }

    // Oversized payloads are refused and never change occupancy.
    #[test]
    fn prop_oversized_rejected(
        max in 0u64..64,
        extra in 1usize..64,
        seeded in payload_strategy(32),
    ) {
        let mut store = CacheStore::new(max, TEST_TTL);
        let _ = store.put("seed".to_string(), seeded);
        let before = store.total_bytes();

        let oversized = Bytes::from(vec![0u8; max as usize + extra]);
        let result = store.put("big".to_string(), oversized);

        prop_assert!(matches!(result, Err(ProxyError::TooLarge { .. })), "oversized payload must be TooLarge");
        prop_assert_eq!(store.total_bytes(), before);
        prop_assert!(store.get("big").is_none());
    }

    // Occupancy never exceeds the cap and always equals the sum of payloads.
    #[test]
    fn prop_occupancy_bounded(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let max = 200;
        let mut store = CacheStore::new(max, Duration::from_millis(1_000));
        let mut now = 1_000u64;

        for op in ops {
            match op {
                CacheOp::Put { key, payload } => {
                    let _ = store.put_at(key, payload, now);
                }
                CacheOp::Remove { key } => {
                    store.remove(&key);
                }
                CacheOp::Touch { key } => {
                    store.touch_at(&key, now);
                }
                CacheOp::Sweep { advance_ms } => {
                    now += advance_ms;
                    store.sweep_expired(now);
                }
                CacheOp::Clear => {
                    store.clear();
                }
            }

            let summed: u64 = store.snapshot().iter().map(|e| e.size).sum();
            prop_assert!(store.total_bytes() <= max);
            prop_assert_eq!(store.total_bytes(), summed);
        }
    }

    // Sweeping with every entry inside its TTL removes nothing.
    #[test]
    fn prop_sweep_within_ttl_is_noop(
        entries in prop::collection::hash_map(key_strategy(), 0u64..500, 1..20),
        ttl_ms in 500u64..5_000,
    ) {
        let mut store = CacheStore::new(u64::MAX, TEST_TTL);
        for (key, offset) in &entries {
            store.put_at(key.clone(), Bytes::from_static(b"x"), 10_000 + offset).unwrap();
        }

        store.set_ttl(Duration::from_millis(ttl_ms));
        let removed = store.sweep_expired(10_000 + ttl_ms);

        prop_assert_eq!(removed, 0);
        prop_assert_eq!(store.len(), entries.len());
    }

    // Refreshing a key only counts the new payload against the budget.
    #[test]
    fn prop_refresh_accounting(old_len in 0usize..=100, new_len in 0usize..=100) {
        let mut store = CacheStore::new(100, TEST_TTL);
        store.put("A".to_string(), Bytes::from(vec![1u8; old_len])).unwrap();

        store.put("A".to_string(), Bytes::from(vec![2u8; new_len])).unwrap();

        prop_assert_eq!(store.total_bytes(), new_len as u64);
        prop_assert_eq!(store.len(), 1);
    }
}

// Concurrency needs fewer cases; each case spawns real threads.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // Concurrent puts for distinct keys never overcommit the cap.
    #[test]
    fn prop_concurrent_puts_respect_cap(sizes in prop::collection::vec(1usize..60, 2..16)) {
        let max = 100u64;
        let store = Arc::new(RwLock::new(CacheStore::new(max, TEST_TTL)));

        let handles: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let store = store.clone();
                thread::spawn(move || {
                    let key = format!("key_{}", i);
                    let ok = store
                        .blocking_write()
                        .put(key.clone(), Bytes::from(vec![0u8; len]))
                        .is_ok();
                    (key, len as u64, ok)
                })
            })
            .collect();

        let results: Vec<(String, u64, bool)> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let guard = store.blocking_read();
        let admitted: HashMap<String, u64> = results
            .into_iter()
            .filter(|(_, _, ok)| *ok)
            .map(|(key, len, _)| (key, len))
            .collect();
        let admitted_total: u64 = admitted.values().sum();

        prop_assert!(admitted_total <= max);
        prop_assert_eq!(guard.total_bytes(), admitted_total);
        prop_assert_eq!(guard.len(), admitted.len());
        for key in admitted.keys() {
            prop_assert!(guard.get(key).is_some());
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_stress_never_exceeds_cap() {
    let max = 1_000u64;
    let store = CacheStore::new(max, TEST_TTL).shared();

    let mut handles = Vec::new();
    for i in 0..64 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..20 {
                let key = format!("k{}", (i * 7 + round) % 40);
                let len = 10 + (i * 13 + round * 5) % 90;
                let _ = store.write().await.put(key, Bytes::from(vec![0u8; len]));
                if round % 5 == 0 {
                    store.write().await.remove(&format!("k{}", round));
                }
                let guard = store.read().await;
                assert!(guard.total_bytes() <= max);
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let guard = store.read().await;
    let summed: u64 = guard.snapshot().iter().map(|e| e.size).sum();
    assert!(guard.total_bytes() <= max);
    assert_eq!(guard.total_bytes(), summed);
}
