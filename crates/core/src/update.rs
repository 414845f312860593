//! Update specification
//!
//! An `Update` is a buffered mutation applied atomically by the store while
//! it holds the target collection's write lock: field assignments (with
//! document merge semantics) plus integer increments. Increments are what
//! make the counter subsystem's "fire an increment and read back the
//! authoritative value" contract possible without a read-before-write race.

use crate::document::Document;
use serde_json::Value;

/// A buffered mutation: assignments plus integer increments
///
/// `set_on_insert` fields apply only when an upserting find-and-modify
/// actually creates the document; on a plain update they are ignored. This
/// is how "create the counter if it has never allocated" stays atomic
/// without clobbering a concurrently created record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
    set_on_insert: Document,
    inc: Vec<(String, i64)>,
}

impl Update {
    /// Create an empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a single field
    pub fn set_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set.set(field, value);
        self
    }

    /// Assign a field only when the operation inserts a new document
    pub fn set_on_insert(mut self, field: impl Into<String>, value: Value) -> Self {
        self.set_on_insert.set(field, value);
        self
    }

    /// Merge a whole document of assignments
    pub fn set_document(mut self, doc: Document) -> Self {
        self.set.deep_merge(&doc);
        self
    }

    /// Increment an integer field by `by` (field treated as 0 when absent
    /// or non-numeric)
    pub fn inc(mut self, field: impl Into<String>, by: i64) -> Self {
        self.inc.push((field.into(), by));
        self
    }

    /// Whether this update carries no mutations
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.set_on_insert.is_empty() && self.inc.is_empty()
    }

    /// Apply the buffered mutations to an existing document
    ///
    /// Assignments follow `Document::deep_merge` semantics (arrays replaced
    /// wholesale, objects merged). Increments run after assignments.
    /// `set_on_insert` fields are NOT applied.
    pub fn apply(&self, target: &mut Document) {
        target.deep_merge(&self.set);
        for (field, by) in &self.inc {
            let current = target.get(field).and_then(Value::as_i64).unwrap_or(0);
            target.set(field.clone(), Value::from(current + by));
        }
    }

    /// Apply the buffered mutations to a freshly inserted document
    ///
    /// `set_on_insert` fields apply first, then the regular assignments and
    /// increments.
    pub fn apply_for_insert(&self, target: &mut Document) {
        target.deep_merge(&self.set_on_insert);
        self.apply(target);
    }
}
