//! Document store driver contract
//!
//! This module defines the `DocumentStore` trait that the repository and
//! the counter allocators are written against. The contract is what the
//! engine actually needs from a driver, nothing more:
//!
//! - aggregation-style reads (filter, sort, skip/limit, projection)
//! - single and unordered-bulk inserts with per-record failure reporting
//! - an atomic conditional update (the version-checked write)
//! - an atomic find-and-modify with upsert (the increment-and-read
//!   primitive)
//!
//! Thread safety: all methods must be safe to call concurrently from
//! multiple threads (Send + Sync). A driver must guarantee that
//! `update_where` and `find_and_modify` are atomic with respect to each
//! other and to all other mutations of the same collection.

use crate::document::Document;
use crate::error::{Result, ValidationError};
use crate::filter::Filter;
use crate::types::OrderBy;
use crate::update::Update;

/// A complete read specification: filter plus result shaping
///
/// Bundles everything `find` needs so the trait surface stays small.
/// Unset shaping fields mean "no shaping": no sort, no skip, no limit,
/// full documents.
#[derive(Debug, Clone, Default)]
pub struct FindSpec {
    /// Predicate to apply
    pub filter: Filter,
    /// Sort specification, applied in order
    pub sort: Vec<OrderBy>,
    /// Documents to skip before collecting results
    pub skip: Option<u64>,
    /// Maximum documents to return
    pub limit: Option<u64>,
    /// Projection whitelist; the native identifier is always kept
    pub projection: Option<Vec<String>>,
}

impl FindSpec {
    /// A spec matching every document, unshaped
    pub fn all() -> Self {
        Self::default()
    }

    /// A spec with the given filter and no shaping
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Set the sort specification
    pub fn with_sort(mut self, sort: Vec<OrderBy>) -> Self {
        self.sort = sort;
        self
    }

    /// Set skip
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the projection whitelist
    pub fn with_projection(mut self, fields: Vec<String>) -> Self {
        self.projection = Some(fields);
        self
    }
}

/// Outcome of an unordered bulk insert
///
/// Partial-success semantics: failed documents are reported with their
/// input position and do not abort the batch.
#[derive(Debug, Default)]
pub struct BulkInsertResult {
    /// Documents that were persisted, in insertion order
    pub inserted: Vec<Document>,
    /// Per-document failures, keyed by input position
    pub failures: Vec<(usize, ValidationError)>,
}

/// Storage abstraction the engine is written against
///
/// Implementations must be safe to share across threads.
pub trait DocumentStore: Send + Sync {
    /// Execute a read specification against a collection
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn find(&self, collection: &str, spec: &FindSpec) -> Result<Vec<Document>>;

    /// Fetch a single document matching the filter, if any
    ///
    /// Absence is `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Count documents matching the filter
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Insert one document, assigning a native identifier when absent
    ///
    /// Returns the document as persisted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` when the identifier is already
    /// taken, or a storage error.
    fn insert(&self, collection: &str, document: Document) -> Result<Document>;

    /// Insert many documents, unordered, with partial-success reporting
    ///
    /// A failed document never aborts the batch; it is reported in
    /// `failures` with its input position.
    ///
    /// # Errors
    ///
    /// Returns an error only if the storage operation as a whole fails.
    fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<BulkInsertResult>;

    /// Atomically update the first document matching the filter
    ///
    /// This is the version-checked write: when the filter pins a version
    /// field, a concurrent writer that already bumped the version makes the
    /// filter match nothing and the call returns `Ok(None)` — no update
    /// happened, callers decide whether to retry.
    ///
    /// Returns the post-update document when a match was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn update_where(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<Option<Document>>;

    /// Atomically find, modify, and return a document
    ///
    /// With `upsert`, a missing match is created from the filter's equality
    /// fields, then the update applies with its insert-only assignments
    /// honored (`Update::set_on_insert`) — so first allocation for a new
    /// key and the steady-state increment are one code path. The returned
    /// document always reflects the post-update state.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn find_and_modify(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<Option<Document>>;

    /// Delete all documents matching the filter, returning the count
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_where(&self, collection: &str, filter: &Filter) -> Result<u64>;
}
