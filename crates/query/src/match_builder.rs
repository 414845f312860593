//! Match builder framework
//!
//! A match builder translates caller criteria into the store-native
//! `Filter` language, one implementation per entity. Translation is driven
//! by a whitelist: only criteria keys named in the builder's
//! correspondence table contribute to the filter, and unknown keys are
//! silently dropped. That permissiveness is deliberate — UI components may
//! send a superset of fields without breaking search.
//!
//! Per-key translation is overridable through the correspondence table's
//! field kinds; conditions that are not expressible per-key (cross-field
//! OR, computed constraints) go through the `other_filters` hook and are
//! AND-concatenated with the rest.

use crate::criteria::{Criteria, Criterion};
use serde_json::Value;
use tabula_core::{DocumentId, Filter};

/// How one criteria key translates into a filter clause
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Values are public id strings; translate to native-id membership
    Id,
    /// Case-insensitive substring match on a string field
    Text,
    /// Membership filter; scalars normalize to one-element sets
    Membership,
    /// Inclusive range filter; plain values fall back to equality
    Range,
    /// Membership inside a sub-document or array of sub-documents
    Nested {
        /// Field of the sub-document the values apply to
        sub_field: String,
    },
}

/// One row of a builder's correspondence table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// Criteria key the caller uses
    pub criteria_key: String,
    /// Document field the clause targets
    pub field: String,
    /// Translation rule
    pub kind: FieldKind,
}

impl FieldRule {
    /// Create a rule mapping `criteria_key` onto `field` with `kind`
    pub fn new(
        criteria_key: impl Into<String>,
        field: impl Into<String>,
        kind: FieldKind,
    ) -> Self {
        Self {
            criteria_key: criteria_key.into(),
            field: field.into(),
            kind,
        }
    }
}

/// Translates criteria into store-native filters for one entity
pub trait MatchBuilder: Send + Sync {
    /// The whitelist: criteria keys this entity understands
    fn correspondence(&self) -> &[FieldRule];

    /// Constraints not expressible per-key; AND-concatenated with the rest
    fn other_filters(&self, _criteria: &Criteria) -> Vec<Filter> {
        Vec::new()
    }

    /// Build the filter for the given criteria
    ///
    /// Empty or fully-unknown criteria produce a filter matching every
    /// record.
    fn build(&self, criteria: &Criteria) -> Filter {
        let mut clauses = Vec::new();
        for rule in self.correspondence() {
            if let Some(criterion) = criteria.get(&rule.criteria_key) {
                if let Some(clause) = translate(rule, criterion) {
                    clauses.push(clause);
                }
            }
        }
        clauses.extend(self.other_filters(criteria));
        Filter::and(clauses)
    }
}

/// A match builder fully described by its correspondence table
///
/// Entities without cross-field constraints need nothing more than this.
pub struct TableMatchBuilder {
    rules: Vec<FieldRule>,
}

impl TableMatchBuilder {
    /// Create a builder from its correspondence table
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }
}

impl MatchBuilder for TableMatchBuilder {
    fn correspondence(&self) -> &[FieldRule] {
        &self.rules
    }
}

/// Translate one criterion according to its rule; None when the criterion
/// shape has nothing usable (e.g. an id list with no parsable id)
fn translate(rule: &FieldRule, criterion: &Criterion) -> Option<Filter> {
    match &rule.kind {
        FieldKind::Id => {
            let ids: Vec<DocumentId> = criterion_values(criterion)
                .iter()
                .filter_map(|v| v.as_str().and_then(DocumentId::from_string))
                .collect();
            // An id criterion with nothing parsable must match nothing,
            // not everything.
            Some(Filter::IdIn(ids))
        }
        FieldKind::Text => match criterion {
            Criterion::Text(fragment) => Some(Filter::text_contains(&rule.field, fragment)),
            Criterion::Value(Value::String(s)) => Some(Filter::text_contains(&rule.field, s)),
            _ => None,
        },
        FieldKind::Membership => {
            Some(Filter::is_in(&rule.field, criterion_values(criterion)))
        }
        FieldKind::Range => match criterion {
            Criterion::Range { min, max } => Some(Filter::Range {
                field: rule.field.clone(),
                min: min.clone(),
                max: max.clone(),
            }),
            Criterion::Value(v) => Some(Filter::eq(&rule.field, v.clone())),
            _ => None,
        },
        FieldKind::Nested { sub_field } => Some(Filter::Elem {
            field: rule.field.clone(),
            filter: Box::new(Filter::is_in(sub_field, criterion_values(criterion))),
        }),
    }
}

/// Normalize a criterion to the set of values it allows
fn criterion_values(criterion: &Criterion) -> Vec<Value> {
    match criterion {
        Criterion::Value(v) => vec![v.clone()],
        Criterion::List(values) => values.clone(),
        Criterion::Text(s) => vec![Value::String(s.clone())],
        Criterion::Range { .. } => Vec::new(),
    }
}
