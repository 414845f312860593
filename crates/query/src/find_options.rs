//! Find options and pagination
//!
//! Value objects bundling criteria, sort, eager-expansion and projection —
//! plus, for paginated reads, offset/limit with system-wide defaults.
//!
//! Normalization happens at the accessor: `FindPaginated::offset()` and
//! `limit()` always return concrete values, so the repository never sees
//! an absent bound. Shape guards run before any store call and surface as
//! structured validation errors.

use crate::criteria::Criteria;
use tabula_core::{Error, OrderBy, Result, ValidationError};

/// Page size applied when the caller does not ask for one
pub const DEFAULT_LIMIT: u64 = 20;

/// Largest page a caller may request
pub const MAX_LIMIT: u64 = 100;

/// Options for unpaginated reads
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Criteria to match
    pub criteria: Criteria,
    /// Sort specification; empty means the entity's default order
    pub order_by: Vec<OrderBy>,
    /// Relation names to eagerly join onto each result
    pub expand: Vec<String>,
    /// Projection whitelist; empty means full documents
    pub fields: Vec<String>,
    /// Field to group on for `count_by`; absent means count_by is a no-op
    pub group_by: Option<String>,
}

impl FindOptions {
    /// Options matching everything, default shaping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the criteria
    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Set the sort specification
    pub fn with_order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    /// Request eager expansion of a relation
    pub fn with_expand(mut self, relation: impl Into<String>) -> Self {
        self.expand.push(relation.into());
        self
    }

    /// Set the projection whitelist
    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    /// Set the grouping field for `count_by`
    pub fn with_group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by = Some(field.into());
        self
    }
}

/// Options for paginated reads
///
/// `offset`/`limit` are stored as supplied and normalized at the accessor;
/// validation rejects shapes the engine will not execute.
#[derive(Debug, Clone, Default)]
pub struct FindPaginated {
    /// The wrapped find options
    pub options: FindOptions,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl FindPaginated {
    /// Paginate the given options with default offset/limit
    pub fn new(options: FindOptions) -> Self {
        Self {
            options,
            offset: None,
            limit: None,
        }
    }

    /// Request an explicit offset
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Request an explicit limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Normalized offset: the supplied value, or 0
    pub fn offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }

    /// Normalized limit: the supplied value, or `DEFAULT_LIMIT`
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    /// Shape guards, run before any store call
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` listing every failed guard:
    /// - `invalidLimit` when the limit is zero
    /// - `limitTooLarge` when the limit exceeds `MAX_LIMIT`
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if let Some(limit) = self.limit {
            if limit == 0 {
                errors.push(ValidationError::new(
                    "limit",
                    "invalidLimit",
                    "limit must be greater than zero",
                ));
            } else if limit > MAX_LIMIT {
                errors.push(ValidationError::new(
                    "limit",
                    "limitTooLarge",
                    format!("limit must not exceed {MAX_LIMIT}"),
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// Paging metadata returned alongside a page of items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paging {
    /// Normalized limit the page was read with
    pub limit: u64,
    /// Normalized offset the page was read with
    pub offset: u64,
    /// Total matches in the collection (read separately from the page;
    /// may be stale relative to `items` under concurrent writes)
    pub total_count: u64,
    /// Number of items actually in this page
    pub item_count: u64,
}
