//! Counter record
//!
//! One Counter per id-namespace (e.g. "projects", "drm"). The record is
//! the only shared mutable state in the engine that concurrent callers
//! contend on, and every mutation of it goes through a version-checked
//! write:
//!
//! - `sequence` is the last-issued ordinal, monotonically non-decreasing
//! - `available_values` is the pool of reclaimed values, ascending, unique
//! - `version` is the optimistic-concurrency token; it increases by
//!   exactly 1 per successful write and two writers can never both commit
//!   against the same observed value

use serde::{Deserialize, Serialize};
use tabula_core::{Document, Error, Result};

/// Default collection counters are stored in
pub const COUNTERS_COLLECTION: &str = "counters";

/// Persisted state of one id-namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Namespace identifier, unique within the counters collection
    pub key: String,
    /// Last-issued ordinal
    pub sequence: u64,
    /// Reclaimed values eligible for reuse, ascending, no duplicates
    #[serde(default)]
    pub available_values: Vec<u64>,
    /// Optimistic-concurrency token
    pub version: u64,
}

impl Counter {
    /// A zeroed counter for a key that has never allocated
    ///
    /// `version == 0` doubles as the "not yet persisted" marker: stored
    /// counters always start life at version 1.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sequence: 0,
            available_values: Vec::new(),
            version: 0,
        }
    }

    /// Whether this counter has ever been persisted
    pub fn is_persisted(&self) -> bool {
        self.version > 0
    }

    /// Merge another counter's state into this one
    ///
    /// Commutative and idempotent: `sequence` takes the maximum,
    /// `available_values` becomes the sorted, deduplicated union. Applying
    /// the same merge twice changes nothing. The version token is NOT
    /// merged; it belongs to the persistence layer.
    pub fn merge(&self, incoming: &Counter) -> Counter {
        let mut pool: Vec<u64> = self
            .available_values
            .iter()
            .chain(incoming.available_values.iter())
            .copied()
            .collect();
        pool.sort_unstable();
        pool.dedup();
        Counter {
            key: self.key.clone(),
            sequence: self.sequence.max(incoming.sequence),
            available_values: pool,
            version: self.version,
        }
    }

    /// Deserialize from a stored document
    ///
    /// The pool is re-normalized to ascending, unique order on the way in,
    /// so callers can rely on the invariant even for records written by an
    /// external system.
    ///
    /// # Errors
    ///
    /// Returns `Error::Serialization` if the document does not have the
    /// counter shape.
    pub fn from_document(document: &Document) -> Result<Self> {
        let mut counter: Counter = serde_json::from_value(document.clone().into_value())
            .map_err(|e| Error::Serialization(format!("malformed counter record: {e}")))?;
        counter.available_values.sort_unstable();
        counter.available_values.dedup();
        Ok(counter)
    }
}
