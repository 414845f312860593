//! Sequence and pool allocation for Tabula
//!
//! This crate mints collision-free numeric identifiers under concurrent
//! writers:
//! - SequenceAllocator: atomic increment-and-read (no read-before-write
//!   race, no retry needed)
//! - PooledAllocator: reclaim-and-extend with version-conditioned writes
//!   and a bounded, jittered retry loop
//! - Counter: the persisted per-namespace record both operate on
//!
//! Formatting raw sequence values into display identifiers is the calling
//! feature's concern, not this crate's.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod counter;
pub mod pool;
pub mod retry;
pub mod sequence;

pub use counter::{Counter, COUNTERS_COLLECTION};
pub use pool::PooledAllocator;
pub use retry::RetryPolicy;
pub use sequence::SequenceAllocator;
