//! Pooled allocator: reclaim-and-extend
//!
//! Some id-namespaces (DRM numbers) must reuse numeric ranges that were
//! handed back by an external system. This allocator draws from the
//! counter's pool of reclaimed values before extending the sequence, which
//! forces a read before the write — so unlike the plain sequence path, it
//! IS racy, and correctness rests on the version-conditioned write plus a
//! bounded, jittered retry loop.
//!
//! Failure contract: a pool allocation that exhausts its retry budget
//! returns an EMPTY vector, not an error. Callers must treat an empty
//! result as "allocation failed, do not proceed"; it is distinguishable
//! from `count == 0` because the caller knows what it asked for.

use crate::counter::{Counter, COUNTERS_COLLECTION};
use crate::retry::RetryPolicy;
use serde_json::json;
use std::sync::Arc;
use tabula_core::{DocumentId, DocumentStore, Error, Filter, Result, Update};
use tracing::{debug, warn};

/// Allocator drawing from a reclaimed-value pool before extending the
/// sequence
#[derive(Clone)]
pub struct PooledAllocator {
    store: Arc<dyn DocumentStore>,
    collection: String,
    policy: RetryPolicy,
}

impl PooledAllocator {
    /// Create a pooled allocator with the default retry policy
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_policy(store, RetryPolicy::default())
    }

    /// Create a pooled allocator with an explicit retry policy
    pub fn with_policy(store: Arc<dyn DocumentStore>, policy: RetryPolicy) -> Self {
        Self {
            store,
            collection: COUNTERS_COLLECTION.to_string(),
            policy,
        }
    }

    /// Override the counters collection
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Allocate `count` unique values for `key`
    ///
    /// Values come from the pool first (smallest reclaimed values are
    /// reused before larger ones), then from extending the sequence, so the
    /// result is ascending within each source and larger numbers stay
    /// "newer". The result is NOT necessarily contiguous. Every write
    /// raises the stored sequence to at least the largest pooled value, so
    /// extensions never revisit a reclaimed number.
    ///
    /// Returns an empty vector when the retry budget is exhausted under
    /// contention.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store itself fails; conflict
    /// exhaustion is the empty-result path, not an error.
    pub fn allocate_from_pool(&self, key: &str, count: usize) -> Result<Vec<u64>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        for attempt in 1..=self.policy.max_attempts {
            let current = self.read(key)?;

            let drawn = count.min(current.available_values.len());
            let mut values: Vec<u64> = current.available_values[..drawn].to_vec();
            let remainder: Vec<u64> = current.available_values[drawn..].to_vec();

            // A reclaim can park values above the stored sequence. The
            // persisted sequence always covers the whole pool as read, so
            // an extension (this round or any later one) can never mint a
            // value the pool already handed out.
            let mut sequence = current
                .sequence
                .max(current.available_values.last().copied().unwrap_or(0));
            while values.len() < count {
                sequence += 1;
                values.push(sequence);
            }

            if self.try_persist(&current, sequence, &remainder)? {
                return Ok(values);
            }

            debug!(key, attempt, "pool allocation lost version race, retrying");
            if attempt < self.policy.max_attempts {
                self.policy.backoff(attempt);
            }
        }

        warn!(
            key,
            attempts = self.policy.max_attempts,
            "pool allocation exhausted its retry budget"
        );
        Ok(Vec::new())
    }

    /// Merge externally returned values back into the counter
    ///
    /// The merge is commutative and idempotent: `sequence` takes the
    /// maximum of both sides and the pools union without duplicates, so
    /// applying the same reclaim twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns `Error::VersionConflict` when every attempt lost the version
    /// race, or `Error::Storage` when the store fails.
    pub fn reclaim(&self, key: &str, incoming: &Counter) -> Result<Counter> {
        for attempt in 1..=self.policy.max_attempts {
            let current = self.read(key)?;
            let merged = current.merge(incoming);

            if self.try_persist(&current, merged.sequence, &merged.available_values)? {
                return Ok(Counter {
                    version: current.version + 1,
                    ..merged
                });
            }

            debug!(key, attempt, "reclaim lost version race, retrying");
            if attempt < self.policy.max_attempts {
                self.policy.backoff(attempt);
            }
        }

        warn!(
            key,
            attempts = self.policy.max_attempts,
            "reclaim exhausted its retry budget"
        );
        Err(Error::VersionConflict {
            key: key.to_string(),
            attempts: self.policy.max_attempts,
        })
    }

    /// Read the current counter for `key` (zeroed when absent)
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store fails.
    pub fn read(&self, key: &str) -> Result<Counter> {
        match self
            .store
            .find_one(&self.collection, &Filter::eq("key", json!(key)))?
        {
            Some(doc) => Counter::from_document(&doc),
            None => Ok(Counter::new(key)),
        }
    }

    /// Persist a mutated counter conditioned on the state observed in
    /// `current`; `false` means the version race was lost
    fn try_persist(&self, current: &Counter, sequence: u64, pool: &[u64]) -> Result<bool> {
        if current.is_persisted() {
            let conditioned = Filter::and(vec![
                Filter::eq("key", json!(current.key)),
                Filter::eq("version", json!(current.version)),
            ]);
            let update = Update::new()
                .set_field("sequence", json!(sequence))
                .set_field("available_values", json!(pool))
                .inc("version", 1);
            Ok(self
                .store
                .update_where(&self.collection, &conditioned, &update)?
                .is_some())
        } else {
            // First write for this key. Insert-only assignments keep this
            // race-safe: if another writer created the counter between our
            // read and this call, the existing record comes back untouched
            // and the identifier comparison detects the loss.
            let ours = DocumentId::new();
            let update = Update::new()
                .set_on_insert("_id", json!(ours.to_string()))
                .set_on_insert("sequence", json!(sequence))
                .set_on_insert("available_values", json!(pool))
                .set_on_insert("version", json!(1));
            let written = self
                .store
                .find_and_modify(
                    &self.collection,
                    &Filter::eq("key", json!(current.key)),
                    &update,
                    true,
                )?
                .ok_or_else(|| Error::Storage {
                    message: format!(
                        "counter upsert for key {:?} returned no document",
                        current.key
                    ),
                })?;
            Ok(written.id() == Some(ours))
        }
    }
}
