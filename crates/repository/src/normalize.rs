//! Identifier normalization
//!
//! The store's native identifier field never crosses the repository
//! boundary: on the way out it becomes the public `id` field, on the way
//! in `id` becomes the native field again. The rename applies recursively
//! through nested objects and arrays, so embedded sub-documents follow the
//! same contract.

use serde_json::Value;
use tabula_core::{Document, NATIVE_ID_FIELD, PUBLIC_ID_FIELD};

/// Rename the native identifier to the public one, recursively
pub fn to_public(doc: Document) -> Document {
    match rename_keys(doc.into_value(), NATIVE_ID_FIELD, PUBLIC_ID_FIELD) {
        Value::Object(map) => Document::from(map),
        _ => Document::new(),
    }
}

/// Rename the public identifier back to the native one, recursively
pub fn to_native(doc: Document) -> Document {
    match rename_keys(doc.into_value(), PUBLIC_ID_FIELD, NATIVE_ID_FIELD) {
        Value::Object(map) => Document::from(map),
        _ => Document::new(),
    }
}

fn rename_keys(value: Value, from: &str, to: &str) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let key = if key == from { to.to_string() } else { key };
                    (key, rename_keys(v, from, to))
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_keys(item, from, to))
                .collect(),
        ),
        other => other,
    }
}
