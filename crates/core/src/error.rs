//! Error types for the tabula engine
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Two failure shapes deliberately do NOT appear here:
//! - "not found" for single-record reads is an `Ok(None)`, never an error
//! - bulk partial failure is reported inside the bulk result value, so that
//!   callers can inspect both the saved records and the per-record failures

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tabula operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single structured validation failure
///
/// Validation errors are raised by shape/type guards before any store call
/// is made. `target` names the offending field or record, `code` is a stable
/// machine-readable discriminator, `message` is for humans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field or record the failure refers to
    pub target: String,
    /// Stable machine-readable code (e.g. "invalidLimit")
    pub code: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        target: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error types for the tabula engine
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying store is unreachable or failed mid-operation
    #[error("Storage error: {message}")]
    Storage {
        /// What the store reported
        message: String,
    },

    /// A store call exceeded its time budget
    #[error("Storage timeout during {operation}")]
    Timeout {
        /// Operation that timed out (e.g. "find", "insert")
        operation: String,
    },

    /// A version-conditioned write lost against concurrent writers and the
    /// retry budget is exhausted
    #[error("Version conflict on key {key:?} after {attempts} attempt(s)")]
    VersionConflict {
        /// Counter key the writers contended on
        key: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// Shape/type guards rejected the input before any store call
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
