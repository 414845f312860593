//! Core types for the tabula engine
//!
//! This module defines the foundational types:
//! - DocumentId: native identifier assigned by the store
//! - Direction / OrderBy: sort specifications
//! - Field name constants shared by the normalization layer

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name of the native identifier field inside stored documents
pub const NATIVE_ID_FIELD: &str = "_id";

/// Name of the public identifier field exposed to callers
pub const PUBLIC_ID_FIELD: &str = "id";

/// Native identifier for a stored document
///
/// A DocumentId is a wrapper around a UUID v4. It is the store's private
/// identity for a record; callers only ever see its string rendering under
/// the public `id` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random DocumentId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a DocumentId from its string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this DocumentId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort direction for one order-by field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// One `{field, direction}` pair of a sort specification
///
/// Sorts are ordered sequences of these pairs; ties on the first pair fall
/// through to the next. The engine-wide default is the native identifier,
/// descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Document field to sort on (dotted paths allowed)
    pub field: String,
    /// Sort direction
    pub direction: Direction,
}

impl OrderBy {
    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    /// The engine-wide default sort: native identifier, descending
    pub fn default_order() -> Vec<OrderBy> {
        vec![OrderBy::desc(NATIVE_ID_FIELD)]
    }
}
