//! Generic repository for Tabula
//!
//! This crate orchestrates storage for any entity type:
//! - Repository: create/update/delete/find/paginate/count/bulk-upsert over
//!   one collection, with identifier normalization at the boundary
//! - EntityModel: the per-entity seam (collection, match builder, identity,
//!   sort lookups, expansions, audit opt-in)
//! - Audit / Auditable: explicit audit-trail composition
//! - HistoryHook: the external audit-trail collaborator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod audit;
pub mod history;
pub mod model;
pub mod normalize;
pub mod repository;

pub use audit::{Audit, Auditable, AUDIT_FIELD};
pub use history::{HistoryHook, HistoryOperation, HistoryOptions};
pub use model::{EntityModel, Expansion, SortLookup};
pub use normalize::{to_native, to_public};
pub use repository::{BulkSaveResult, GroupCount, Page, Repository, SaveOptions};
