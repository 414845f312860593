//! Core types and traits for Tabula
//!
//! This crate defines the foundational types used throughout the engine:
//! - DocumentId: native identifier for stored documents
//! - Document: the JSON-object unit of storage
//! - Filter: the store-native predicate language
//! - Update: buffered mutation spec (assignments + increments)
//! - Error: error type hierarchy
//! - Traits: the `DocumentStore` driver contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod filter;
pub mod traits;
pub mod types;
pub mod update;

// Re-export commonly used types and traits
pub use document::Document;
pub use error::{Error, Result, ValidationError};
pub use filter::{compare_values, Filter};
pub use traits::{BulkInsertResult, DocumentStore, FindSpec};
pub use types::{Direction, DocumentId, OrderBy, NATIVE_ID_FIELD, PUBLIC_ID_FIELD};
pub use update::Update;
