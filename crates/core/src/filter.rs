//! Store-native filter language
//!
//! `Filter` is the predicate language executed by the document store. Match
//! builders translate caller criteria into this AST; the store (or any other
//! driver) evaluates it against documents. Evaluation lives next to the AST
//! so every driver shares one set of matching rules.
//!
//! # Matching rules
//!
//! - `Eq` follows array-membership semantics: a field holding an array
//!   matches when any element equals the probe value. Scalars compare
//!   directly. This is what makes "scalar normalized to one-element set"
//!   membership filters cheap to build.
//! - `TextContains` is a case-insensitive substring match on string fields.
//! - `Range` compares numbers with numbers and strings with strings;
//!   mismatched types never match.
//! - `Elem` descends into a sub-document, or into each element of an array
//!   of sub-documents, and matches if any of them satisfies the inner
//!   filter.

use crate::document::Document;
use crate::types::DocumentId;
use serde_json::Value;
use std::cmp::Ordering;

/// A predicate over documents
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Conjunction; empty conjunction matches everything
    And(Vec<Filter>),
    /// Disjunction; empty disjunction matches nothing
    Or(Vec<Filter>),
    /// Field equals value (array fields match on membership)
    Eq {
        /// Dotted field path
        field: String,
        /// Probe value
        value: Value,
    },
    /// Field value is a member of the allowed set
    In {
        /// Dotted field path
        field: String,
        /// Allowed values
        values: Vec<Value>,
    },
    /// Case-insensitive substring match on a string field
    TextContains {
        /// Dotted field path
        field: String,
        /// Needle, matched case-insensitively
        needle: String,
    },
    /// Field value lies within the (inclusive) bounds
    Range {
        /// Dotted field path
        field: String,
        /// Inclusive lower bound, if any
        min: Option<Value>,
        /// Inclusive upper bound, if any
        max: Option<Value>,
    },
    /// Native identifier is one of the given ids
    IdIn(Vec<DocumentId>),
    /// A sub-document (or any element of an array of sub-documents)
    /// satisfies the inner filter
    Elem {
        /// Field holding the sub-document or array
        field: String,
        /// Predicate applied to the sub-document(s)
        filter: Box<Filter>,
    },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

impl Filter {
    /// Conjunction that collapses trivial shapes
    ///
    /// No clauses yields `All`; a single clause yields the clause itself.
    pub fn and(mut clauses: Vec<Filter>) -> Filter {
        clauses.retain(|c| !matches!(c, Filter::All));
        match clauses.len() {
            0 => Filter::All,
            1 => clauses.pop().unwrap_or(Filter::All),
            _ => Filter::And(clauses),
        }
    }

    /// Equality on a field
    pub fn eq(field: impl Into<String>, value: Value) -> Filter {
        Filter::Eq {
            field: field.into(),
            value,
        }
    }

    /// Membership on a field
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Filter {
        Filter::In {
            field: field.into(),
            values,
        }
    }

    /// Case-insensitive substring match
    pub fn text_contains(field: impl Into<String>, needle: impl Into<String>) -> Filter {
        Filter::TextContains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    /// Evaluate this filter against a document
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Filter::Or(clauses) => clauses.iter().any(|c| c.matches(doc)),
            Filter::Eq { field, value } => {
                doc.get_path(field).is_some_and(|v| value_eq(v, value))
            }
            Filter::In { field, values } => doc
                .get_path(field)
                .is_some_and(|v| values.iter().any(|probe| value_eq(v, probe))),
            Filter::TextContains { field, needle } => doc
                .get_path(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
            Filter::Range { field, min, max } => {
                let Some(v) = doc.get_path(field) else {
                    return false;
                };
                let above = min.as_ref().map_or(true, |m| {
                    compare_values(v, m).is_some_and(|o| o != Ordering::Less)
                });
                let below = max.as_ref().map_or(true, |m| {
                    compare_values(v, m).is_some_and(|o| o != Ordering::Greater)
                });
                above && below
            }
            Filter::IdIn(ids) => doc.id().is_some_and(|id| ids.contains(&id)),
            Filter::Elem { field, filter } => match doc.get_path(field) {
                Some(Value::Object(map)) => filter.matches(&Document::from(map.clone())),
                Some(Value::Array(items)) => items.iter().any(|item| match item {
                    Value::Object(map) => filter.matches(&Document::from(map.clone())),
                    _ => false,
                }),
                _ => false,
            },
        }
    }

    /// Top-level equality constraints of this filter
    ///
    /// Used to seed the document created by an upserting find-and-modify:
    /// a fresh record starts from the fields the filter pinned down.
    /// Only `Eq` clauses reachable through `And` are considered.
    pub fn equality_fields(&self) -> Vec<(String, Value)> {
        let mut fields = Vec::new();
        self.collect_equalities(&mut fields);
        fields
    }

    fn collect_equalities(&self, out: &mut Vec<(String, Value)>) {
        match self {
            Filter::Eq { field, value } => out.push((field.clone(), value.clone())),
            Filter::And(clauses) => {
                for clause in clauses {
                    clause.collect_equalities(out);
                }
            }
            _ => {}
        }
    }
}

/// Equality with array-membership semantics on the document side
fn value_eq(document_value: &Value, probe: &Value) -> bool {
    match document_value {
        Value::Array(items) => items.iter().any(|item| item == probe),
        other => other == probe,
    }
}

/// Partial ordering over JSON scalars
///
/// Numbers compare with numbers, strings with strings. Anything else is
/// unordered and yields None, which `Range` treats as "does not match".
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
