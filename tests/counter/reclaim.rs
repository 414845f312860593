//! Reclaim Tests
//!
//! Tests for the reclaim (overwrite) operation:
//! - Merge takes the max sequence and unions the pools
//! - Applying the same reclaim twice changes nothing
//! - Concurrent reclaims converge to the same merged state

use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use tabula::{Counter, Document, DocumentStore, MemoryStore, PooledAllocator, RetryPolicy};

fn seed_counter(store: &Arc<MemoryStore>, key: &str, sequence: u64, pool: &[u64]) {
    store
        .insert(
            "counters",
            Document::from_value(json!({
                "key": key,
                "sequence": sequence,
                "available_values": pool,
                "version": 1
            }))
            .unwrap(),
        )
        .unwrap();
}

#[test]
fn reclaim_merges_max_sequence_and_pool_union() {
    let store = Arc::new(MemoryStore::new());
    seed_counter(&store, "drm", 10, &[3, 7]);
    let alloc = PooledAllocator::new(store);

    let incoming = Counter {
        key: "drm".into(),
        sequence: 14,
        available_values: vec![7, 5],
        version: 0,
    };
    let merged = alloc.reclaim("drm", &incoming).unwrap();
    assert_eq!(merged.sequence, 14);
    assert_eq!(merged.available_values, vec![3, 5, 7]);
}

#[test]
fn reclaim_applied_twice_is_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed_counter(&store, "drm", 10, &[3]);
    let alloc = PooledAllocator::new(store);

    let incoming = Counter {
        key: "drm".into(),
        sequence: 12,
        available_values: vec![4, 8],
        version: 0,
    };
    let first = alloc.reclaim("drm", &incoming).unwrap();
    let second = alloc.reclaim("drm", &incoming).unwrap();

    assert_eq!(first.sequence, second.sequence);
    assert_eq!(first.available_values, second.available_values);
    assert_eq!(second.available_values, vec![3, 4, 8]);
}

#[test]
fn reclaim_bootstraps_an_unknown_key() {
    let store = Arc::new(MemoryStore::new());
    let alloc = PooledAllocator::new(store);

    let incoming = Counter {
        key: "drm".into(),
        sequence: 30,
        available_values: vec![21, 25],
        version: 0,
    };
    let merged = alloc.reclaim("drm", &incoming).unwrap();
    assert_eq!(merged.sequence, 30);
    assert_eq!(merged.available_values, vec![21, 25]);
    assert_eq!(merged.version, 1);
}

#[test]
fn concurrent_reclaims_converge() {
    let store = Arc::new(MemoryStore::new());
    seed_counter(&store, "drm", 10, &[]);
    let threads = 4;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let alloc = PooledAllocator::with_policy(
                    store,
                    RetryPolicy {
                        max_attempts: 50,
                        ..RetryPolicy::default()
                    },
                );
                let incoming = Counter {
                    key: "drm".into(),
                    sequence: 10 + i as u64,
                    available_values: vec![i as u64 + 1, 100],
                    version: 0,
                };
                barrier.wait();
                alloc.reclaim("drm", &incoming).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let alloc = PooledAllocator::new(store);
    let merged = alloc.read("drm").unwrap();
    // Every writer's contribution survived, whatever the commit order.
    assert_eq!(merged.sequence, 13);
    assert_eq!(merged.available_values, vec![1, 2, 3, 4, 100]);
    // One version bump per successful reclaim.
    assert_eq!(merged.version, 1 + threads as u64);
}
