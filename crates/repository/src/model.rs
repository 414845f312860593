//! Entity model: the per-entity seam of the generic repository
//!
//! One `EntityModel` implementation describes everything the repository
//! needs to know about an entity type: where it lives, how its criteria
//! translate, how its identity is read, which sorts need a lookup join,
//! which relations can be expanded, and whether it carries an audit trail.

use tabula_core::{
    Document, DocumentId, Filter, OrderBy, Result, ValidationError, PUBLIC_ID_FIELD,
};
use tabula_query::MatchBuilder;

/// Declares that sorting on `field` requires joining a lookup collection
///
/// The repository resolves the join (local field → foreign field), sorts
/// on the looked-up label, and never exposes the joined value to callers.
#[derive(Debug, Clone)]
pub struct SortLookup {
    /// Order-by field name that triggers this join
    pub field: String,
    /// Collection holding the lookup records
    pub collection: String,
    /// Entity field holding the lookup reference
    pub local_field: String,
    /// Lookup-record field matched against `local_field`
    pub foreign_field: String,
    /// Lookup-record field whose value the sort uses
    pub label_field: String,
}

/// Declares a relation that callers may eagerly expand
#[derive(Debug, Clone)]
pub struct Expansion {
    /// Relation name used in `FindOptions::expand`
    pub name: String,
    /// Collection holding the related records
    pub collection: String,
    /// Entity field holding the relation reference
    pub local_field: String,
    /// Related-record field matched against `local_field`
    pub foreign_field: String,
    /// Entity field the related record is embedded under
    pub target_field: String,
}

/// Everything the generic repository needs to know about one entity type
pub trait EntityModel: Send + Sync {
    /// Collection this entity persists in
    fn collection(&self) -> &str;

    /// Criteria translation for this entity
    fn match_builder(&self) -> &dyn MatchBuilder;

    /// Default sort when the caller requests none
    ///
    /// The engine-wide default is the native identifier, descending.
    fn default_order(&self) -> Vec<OrderBy> {
        OrderBy::default_order()
    }

    /// Read the identity of an entity as supplied by a caller
    ///
    /// The default reads the public `id` field. Entities identified by a
    /// business key override this.
    fn object_identifier(&self, entity: &Document) -> Option<String> {
        entity.get_str(PUBLIC_ID_FIELD).map(str::to_string)
    }

    /// Filter locating the record behind an identifier
    ///
    /// The default treats the identifier as a native id; an identifier
    /// that does not parse matches nothing. Business-key entities override
    /// this together with `object_identifier`.
    fn identifier_filter(&self, identifier: &str) -> Filter {
        match DocumentId::from_string(identifier) {
            Some(id) => Filter::IdIn(vec![id]),
            None => Filter::IdIn(Vec::new()),
        }
    }

    /// Sorts that require a lookup join
    fn sort_lookups(&self) -> &[SortLookup] {
        &[]
    }

    /// Relations callers may expand
    fn expansions(&self) -> &[Expansion] {
        &[]
    }

    /// Whether the repository stamps an audit trail on this entity
    fn audited(&self) -> bool {
        false
    }

    /// Per-record validation for save paths
    ///
    /// Failures do not abort a bulk save; they are collected and reported
    /// alongside the successes.
    fn validate(&self, _entity: &Document) -> Vec<ValidationError> {
        Vec::new()
    }

    /// Extension point invoked with the matched records before a delete
    /// removes anything
    ///
    /// # Errors
    ///
    /// An error aborts the delete before any record is removed.
    fn on_delete(&self, _matches: &[Document]) -> Result<()> {
        Ok(())
    }
}
