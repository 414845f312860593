//! Query layer for Tabula
//!
//! This crate turns caller intent into store-native reads:
//! - Criteria: immutable field-to-criterion mappings callers build
//! - MatchBuilder: per-entity, whitelist-driven translation into `Filter`
//! - FindOptions / FindPaginated: sort, expansion, projection, and
//!   normalized offset/limit with shape guards

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod criteria;
pub mod find_options;
pub mod match_builder;

pub use criteria::{Criteria, Criterion};
pub use find_options::{FindOptions, FindPaginated, Paging, DEFAULT_LIMIT, MAX_LIMIT};
pub use match_builder::{FieldKind, FieldRule, MatchBuilder, TableMatchBuilder};
