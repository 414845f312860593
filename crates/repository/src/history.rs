//! History hook: the audit-trail collaborator
//!
//! The repository invokes a `HistoryHook`, when one is installed, after
//! every create/update and before returning from a delete. The hook is
//! implemented elsewhere; a failing hook is logged and never rolls back
//! the primary write.

use tabula_core::{Document, Result};

/// What happened to the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOperation {
    /// A record was created
    Create,
    /// A record was updated
    Update,
    /// A record was deleted
    Delete,
}

/// Caller-supplied context for a history entry
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Free-form comment attached to the entry
    pub comment: Option<String>,
    /// Categorization tags for the entry
    pub categories: Vec<String>,
}

/// Records an audit trail of repository mutations
pub trait HistoryHook: Send + Sync {
    /// Record one mutation
    ///
    /// `previous` is the record before the mutation (absent on create),
    /// `current` the record after it (absent on delete).
    ///
    /// # Errors
    ///
    /// Errors are the hook's own; the repository logs them and continues.
    fn record(
        &self,
        operation: HistoryOperation,
        previous: Option<&Document>,
        current: Option<&Document>,
        options: &HistoryOptions,
    ) -> Result<()>;
}
