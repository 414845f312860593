//! Tabula - embedded document-store repository engine
//!
//! Tabula provides a generic repository abstraction over a document store,
//! combined with an optimistic-concurrency counter subsystem for minting
//! human-readable, collision-free identifiers under concurrent writers.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::json;
//! use tabula::{
//!     Document, FieldKind, FieldRule, MemoryStore, Repository, SaveOptions,
//!     SequenceAllocator, TableMatchBuilder,
//! };
//! use tabula::repository::EntityModel;
//! use tabula::query::MatchBuilder;
//!
//! struct Projects {
//!     builder: TableMatchBuilder,
//! }
//!
//! impl EntityModel for Projects {
//!     fn collection(&self) -> &str {
//!         "projects"
//!     }
//!     fn match_builder(&self) -> &dyn MatchBuilder {
//!         &self.builder
//!     }
//! }
//!
//! # fn main() -> tabula::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//!
//! // Mint a project number
//! let sequences = SequenceAllocator::new(store.clone());
//! let number = sequences.allocate("projects", 1)?;
//!
//! // Persist a project
//! let projects = Repository::new(
//!     store,
//!     Projects {
//!         builder: TableMatchBuilder::new(vec![FieldRule::new(
//!             "status", "status", FieldKind::Membership,
//!         )]),
//!     },
//! );
//! let saved = projects.save(
//!     &Document::from_value(json!({
//!         "label": "resurface main street",
//!         "number": format!("P-{number:04}"),
//!     }))?,
//!     &SaveOptions::new(),
//! )?;
//! assert!(saved.get_str("id").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`core`](tabula_core): documents, filters, updates, the driver trait
//! - [`store`](tabula_store): the in-memory driver implementation
//! - [`counter`](tabula_counter): sequence and pooled id allocation
//! - [`query`](tabula_query): criteria, match builders, find options
//! - [`repository`](tabula_repository): the generic repository facade

pub use tabula_core as core;
pub use tabula_counter as counter;
pub use tabula_query as query;
pub use tabula_repository as repository;
pub use tabula_store as store;

pub use tabula_core::{
    Direction, Document, DocumentId, DocumentStore, Error, Filter, FindSpec, OrderBy, Result,
    Update, ValidationError,
};
pub use tabula_counter::{Counter, PooledAllocator, RetryPolicy, SequenceAllocator};
pub use tabula_query::{
    Criteria, Criterion, FieldKind, FieldRule, FindOptions, FindPaginated, TableMatchBuilder,
};
pub use tabula_repository::{
    Audit, BulkSaveResult, HistoryOptions, Page, Repository, SaveOptions,
};
pub use tabula_store::MemoryStore;
