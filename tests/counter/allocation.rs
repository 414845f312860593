//! Allocation Semantics Tests
//!
//! Tests for the allocators' single-caller contracts:
//! - Sequence values advance and never repeat
//! - Pool values drain smallest-first before the sequence extends
//! - Formatting is the caller's concern: raw values come back untouched

use serde_json::json;
use std::sync::Arc;
use tabula::{
    Counter, Document, DocumentStore, Filter, MemoryStore, PooledAllocator, RetryPolicy,
    SequenceAllocator,
};

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

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

// ============================================================================
// Sequence allocation
// ============================================================================

#[test]
fn sequence_values_monotonically_increase() {
    let alloc = SequenceAllocator::new(store());

    let mut prev = 0u64;
    for _ in 0..100 {
        let v = alloc.allocate("projects", 1).unwrap();
        assert!(v > prev, "Sequence should increase: {} -> {}", prev, v);
        prev = v;
    }
}

#[test]
fn first_allocation_for_a_key_upserts() {
    let store = store();
    let alloc = SequenceAllocator::new(store.clone());

    assert_eq!(
        store
            .count("counters", &Filter::eq("key", json!("projects")))
            .unwrap(),
        0
    );
    assert_eq!(alloc.allocate("projects", 1).unwrap(), 1);
    assert_eq!(
        store
            .count("counters", &Filter::eq("key", json!("projects")))
            .unwrap(),
        1
    );
}

#[test]
fn allocations_on_distinct_keys_are_independent() {
    let alloc = SequenceAllocator::new(store());

    assert_eq!(alloc.allocate("projects", 1).unwrap(), 1);
    assert_eq!(alloc.allocate("projects", 1).unwrap(), 2);
    assert_eq!(alloc.allocate("drm", 1).unwrap(), 1);
    assert_eq!(alloc.allocate("submissions", 10).unwrap(), 10);
}

#[test]
fn caller_formats_display_identifiers_from_raw_values() {
    let alloc = SequenceAllocator::new(store());
    let number = alloc.allocate("projects", 1).unwrap();
    // The allocator hands back the raw ordinal; prefix and padding are the
    // feature's own business.
    assert_eq!(format!("P-{number:05}"), "P-00001");
}

// ============================================================================
// Pool allocation
// ============================================================================

#[test]
fn pool_drains_smallest_first_then_extends_monotonically() {
    let store = store();
    seed_counter(&store, "drm", 10, &[3, 7]);
    let alloc = PooledAllocator::new(store);

    let values = alloc.allocate_from_pool("drm", 3).unwrap();
    assert_eq!(values, vec![3, 7, 11]);
}

#[test]
fn pool_allocations_are_unique_across_calls() {
    let store = store();
    seed_counter(&store, "drm", 0, &[2, 9, 4]);
    let alloc = PooledAllocator::new(store);

    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.extend(alloc.allocate_from_pool("drm", 2).unwrap());
    }
    let mut deduped = seen.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(seen.len(), 10);
    assert_eq!(deduped.len(), 10, "no value may be allocated twice");
}

#[test]
fn zero_count_is_distinguishable_from_exhaustion_by_the_caller() {
    let alloc = PooledAllocator::with_policy(store(), RetryPolicy::immediate(3));
    // The caller asked for nothing and got nothing; only the caller knows
    // whether an empty result means failure.
    assert!(alloc.allocate_from_pool("drm", 0).unwrap().is_empty());
}

#[test]
fn reclaimed_counter_state_survives_allocation_roundtrip() {
    let store = store();
    let alloc = PooledAllocator::new(store.clone());

    let incoming = Counter {
        key: "drm".into(),
        sequence: 20,
        available_values: vec![12, 15],
        version: 0,
    };
    alloc.reclaim("drm", &incoming).unwrap();

    let values = alloc.allocate_from_pool("drm", 3).unwrap();
    assert_eq!(values, vec![12, 15, 21]);
}
