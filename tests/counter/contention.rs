//! Contention Tests
//!
//! Tests for allocator correctness under concurrent callers:
//! - The multiset of sequence values returned by N parallel allocators has
//!   no duplicates
//! - Pooled allocation retries after lost version races and never double
//!   allocates
//! - Retry exhaustion degrades to an empty result, not a panic or a
//!   duplicate

use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use tabula::{
    Document, DocumentStore, MemoryStore, PooledAllocator, RetryPolicy, SequenceAllocator,
};

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
fn concurrent_sequence_allocation_unique() {
    let store = Arc::new(MemoryStore::new());
    let threads = 8;
    let per_thread = 250;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let alloc = SequenceAllocator::new(store);
                barrier.wait();
                let mut values = Vec::with_capacity(per_thread);
                for _ in 0..per_thread {
                    values.push(alloc.allocate("projects", 1).unwrap());
                }
                values
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }

    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(
        unique.len(),
        threads * per_thread,
        "two allocations returned the same sequence value"
    );
    assert_eq!(all.iter().max(), Some(&((threads * per_thread) as u64)));
}

#[test]
fn concurrent_pool_allocation_never_hands_out_a_value_twice() {
    let store = Arc::new(MemoryStore::new());
    seed_counter(&store, "drm", 0, &[5, 9, 14]);
    let threads = 6;
    let per_call = 2;
    let barrier = Arc::new(Barrier::new(threads));
    let collected = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let store = store.clone();
            let barrier = barrier.clone();
            let collected = collected.clone();
            thread::spawn(move || {
                // Generous retry budget: the point here is uniqueness, not
                // exhaustion behavior.
                let alloc = PooledAllocator::with_policy(
                    store,
                    RetryPolicy {
                        max_attempts: 50,
                        ..RetryPolicy::default()
                    },
                );
                barrier.wait();
                let values = alloc.allocate_from_pool("drm", per_call).unwrap();
                collected.lock().unwrap().extend(values);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let all = collected.lock().unwrap().clone();
    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len(), "a pooled value was allocated twice");

    // Every caller either got a full allocation or an empty degraded result.
    assert!(all.len() % per_call == 0);

    // The three reclaimed values were consumed before any extension beyond
    // them was needed.
    if all.len() >= 3 {
        for reclaimed in [5u64, 9, 14] {
            assert!(
                all.contains(&reclaimed),
                "pool value {reclaimed} was skipped while the sequence extended"
            );
        }
    }
}

#[test]
fn exhausted_pool_allocation_consumes_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_counter(&store, "drm", 10, &[3]);

    // A single attempt against a counter whose version moves right before
    // the write: simulate by pre-bumping the version after the allocator's
    // read via a second allocator thread hammering the same key.
    let contender = PooledAllocator::with_policy(store.clone(), RetryPolicy::immediate(1));
    let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let hammer = {
        let store = store.clone();
        let stop = stop.clone();
        thread::spawn(move || {
            let alloc = PooledAllocator::with_policy(
                store,
                RetryPolicy {
                    max_attempts: 1000,
                    ..RetryPolicy::default()
                },
            );
            let mut minted = Vec::new();
            while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                minted.extend(alloc.allocate_from_pool("drm", 1).unwrap());
            }
            minted
        })
    };

    let mut results = Vec::new();
    for _ in 0..20 {
        results.extend(contender.allocate_from_pool("drm", 1).unwrap());
    }
    stop.store(true, std::sync::atomic::Ordering::Relaxed);
    let hammered = hammer.join().unwrap();

    // Whatever each caller got, nothing overlaps: an exhausted attempt
    // consumed no value.
    let mut all = results;
    all.extend(hammered);
    let unique: HashSet<u64> = all.iter().copied().collect();
    assert_eq!(unique.len(), all.len());
}
