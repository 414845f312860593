//! In-memory storage backend for Tabula
//!
//! This crate implements the `DocumentStore` driver contract:
//! - MemoryStore: DashMap of collections, RwLock per collection
//! - Document-atomic `update_where` / `find_and_modify` (the primitives the
//!   counter subsystem's optimistic concurrency is built on)
//! - Result shaping (sort/skip/limit/projection) in the executor
//!
//! Different collections never contend; mutations of one collection
//! serialize under its write lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collection;
pub mod executor;
pub mod memory;

pub use collection::{Collection, VersionedDocument};
pub use memory::MemoryStore;
