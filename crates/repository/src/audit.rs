//! Audit trail composition
//!
//! Audited entities hold an explicit `audit` sub-document stamped by the
//! repository; the `Auditable` trait is the capability interface typed
//! domain structs implement to expose it. Composition over inheritance:
//! there is no mixin chain, just a field and a trait.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Field audited entities carry their trail under
pub const AUDIT_FIELD: &str = "audit";

/// Creation and modification trail of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Who created it, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// When the record was last modified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
    /// Who last modified it, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
}

impl Audit {
    /// Trail for a freshly created record
    pub fn created(actor: Option<&str>) -> Self {
        Self {
            created_at: Utc::now(),
            created_by: actor.map(str::to_string),
            last_modified_at: None,
            last_modified_by: None,
        }
    }

    /// The `audit` sub-document for a creation, as stored
    pub fn creation_value(actor: Option<&str>) -> Value {
        let audit = Self::created(actor);
        json!({
            "created_at": audit
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            "created_by": audit.created_by,
        })
    }

    /// The `audit` sub-document fields for a modification, as stored
    ///
    /// Merged over an existing trail: creation fields survive, the
    /// modification fields are replaced.
    pub fn modification_value(actor: Option<&str>) -> Value {
        json!({
            "last_modified_at": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "last_modified_by": actor,
        })
    }
}

/// Capability interface for domain types carrying an audit trail
pub trait Auditable {
    /// The record's audit trail
    fn audit(&self) -> &Audit;

    /// Mutable access for stamping
    fn audit_mut(&mut self) -> &mut Audit;
}
