//! Caller-supplied search criteria
//!
//! A `Criteria` is an ad hoc mapping from field name to criterion,
//! immutable once built. Callers (UI components, use cases) may send a
//! superset of fields; whether a key means anything is the match builder's
//! decision, so nothing here rejects unknown keys.

use serde_json::Value;
use std::collections::BTreeMap;

/// One constraint on one field
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// A single scalar value (normalized to a one-element set by
    /// membership rules)
    Value(Value),
    /// A set of allowed values
    List(Vec<Value>),
    /// An inclusive range; open ends allowed
    Range {
        /// Inclusive lower bound, if any
        min: Option<Value>,
        /// Inclusive upper bound, if any
        max: Option<Value>,
    },
    /// A free-text fragment, matched case-insensitively
    Text(String),
}

/// Immutable mapping from field name to criterion
///
/// Built through the consuming `with_*` methods; iteration order is the
/// field names' lexicographic order, so built filters are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria(BTreeMap<String, Criterion>);

impl Criteria {
    /// An empty criteria set (matches everything once built)
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `field` to a single value
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.0.insert(field.into(), Criterion::Value(value));
        self
    }

    /// Constrain `field` to a set of allowed values
    pub fn with_list(mut self, field: impl Into<String>, values: Vec<Value>) -> Self {
        self.0.insert(field.into(), Criterion::List(values));
        self
    }

    /// Constrain `field` to an inclusive range
    pub fn with_range(
        mut self,
        field: impl Into<String>,
        min: Option<Value>,
        max: Option<Value>,
    ) -> Self {
        self.0.insert(field.into(), Criterion::Range { min, max });
        self
    }

    /// Constrain `field` with a free-text fragment
    pub fn with_text(mut self, field: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.0
            .insert(field.into(), Criterion::Text(fragment.into()));
        self
    }

    /// Remove a criterion (useful when deriving criteria from a wider set)
    pub fn without(mut self, field: &str) -> Self {
        self.0.remove(field);
        self
    }

    /// Look up the criterion for a field
    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.0.get(field)
    }

    /// Whether any criterion is present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of criteria
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, criterion)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Criterion)> {
        self.0.iter()
    }
}
