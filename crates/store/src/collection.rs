//! One collection's in-memory state
//!
//! A collection is a `parking_lot::RwLock` over an `FxHashMap` keyed by
//! native identifier. Every mutation of a collection happens under its
//! write lock, which is what makes `update_where` and `find_and_modify`
//! document-atomic: a concurrent writer can never observe a half-applied
//! update, and two conditional writes against the same version can never
//! both commit.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tabula_core::{Document, DocumentId};

/// A document together with its store-level write metadata
///
/// `version` is the store's global write counter at the time of the write,
/// distinct from any application-level version field inside the document
/// (the Counter's `version` token is application data).
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    /// The stored document
    pub document: Document,
    /// Store-level write version (monotonically increasing across the store)
    pub version: u64,
    /// Write time, millis since epoch
    pub timestamp: i64,
}

/// In-memory state of one collection
#[derive(Debug, Default)]
pub struct Collection {
    /// Documents keyed by native identifier
    pub(crate) data: RwLock<FxHashMap<DocumentId, VersionedDocument>>,
}

impl Collection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in this collection
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether this collection holds no documents
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
