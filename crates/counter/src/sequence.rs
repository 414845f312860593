//! Sequence allocator
//!
//! The straightforward id-generation path: one store-level atomic
//! increment-and-read per allocation. There is no read before the write,
//! so there is nothing to race — the store's document-atomic
//! `find_and_modify` serializes concurrent writers, and the first
//! allocation for a new key is the same operation with upsert semantics.
//!
//! The allocator returns raw sequence values; formatting them into display
//! identifiers (prefixes, zero-padding) is the calling feature's concern.

use crate::counter::{Counter, COUNTERS_COLLECTION};
use serde_json::json;
use std::sync::Arc;
use tabula_core::{DocumentStore, Error, Filter, Result, Update};

/// Stateless facade minting sequence values from a counters collection
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl SequenceAllocator {
    /// Create an allocator over the default counters collection
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: COUNTERS_COLLECTION.to_string(),
        }
    }

    /// Create an allocator over a custom collection
    pub fn with_collection(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Atomically advance `key`'s sequence by `increment_by` and return
    /// the post-increment value
    ///
    /// A missing counter is created as part of the same atomic operation
    /// (first allocation yields `increment_by`).
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store is unreachable; the caller
    /// must not assume a value was consumed.
    pub fn allocate(&self, key: &str, increment_by: u64) -> Result<u64> {
        let filter = Filter::eq("key", json!(key));
        let update = Update::new()
            .inc("sequence", increment_by as i64)
            .inc("version", 1);
        let written = self
            .store
            .find_and_modify(&self.collection, &filter, &update, true)?
            .ok_or_else(|| Error::Storage {
                message: format!("counter upsert for key {key:?} returned no document"),
            })?;
        Ok(Counter::from_document(&written)?.sequence)
    }

    /// Advance `key`'s sequence conditioned on a known prior version
    ///
    /// A version mismatch is NOT an error: the write simply does not
    /// happen, and the authoritative current sequence is read back and
    /// returned. The contract is "fire an increment and read back the
    /// authoritative value".
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store is unreachable.
    pub fn allocate_versioned(
        &self,
        key: &str,
        increment_by: u64,
        expected_version: u64,
    ) -> Result<u64> {
        let conditioned = Filter::and(vec![
            Filter::eq("key", json!(key)),
            Filter::eq("version", json!(expected_version)),
        ]);
        let update = Update::new()
            .inc("sequence", increment_by as i64)
            .inc("version", 1);
        if let Some(written) = self
            .store
            .update_where(&self.collection, &conditioned, &update)?
        {
            return Ok(Counter::from_document(&written)?.sequence);
        }

        // Lost the condition; read back whatever is authoritative now.
        match self
            .store
            .find_one(&self.collection, &Filter::eq("key", json!(key)))?
        {
            Some(current) => Ok(Counter::from_document(&current)?.sequence),
            None => self.allocate(key, increment_by),
        }
    }

    /// Read a counter without mutating it
    ///
    /// A key that has never allocated yields the zeroed counter.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` when the store is unreachable.
    pub fn read(&self, key: &str) -> Result<Counter> {
        match self
            .store
            .find_one(&self.collection, &Filter::eq("key", json!(key)))?
        {
            Some(doc) => Counter::from_document(&doc),
            None => Ok(Counter::new(key)),
        }
    }

    /// Collection this allocator persists counters in
    pub fn collection(&self) -> &str {
        &self.collection
    }
}
