//! Document representation
//!
//! A `Document` is a JSON object: the unit of storage, the unit of
//! filtering, and the shape every entity takes at the repository boundary.
//! It wraps `serde_json::Map` with typed accessors, dotted-path reads, and
//! the merge semantics the repository relies on (arrays replaced wholesale,
//! nested objects merged field-by-field).

use crate::error::{Error, Result};
use crate::types::{DocumentId, NATIVE_ID_FIELD};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object persisted through the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a document from a JSON value
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidOperation` if the value is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::InvalidOperation(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Consume the document, yielding the underlying JSON value
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Mutably borrow the underlying map
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Get a top-level field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Get a field by dotted path (e.g. `"audit.created_by"`)
    ///
    /// Only object nesting is traversed; an array in the middle of the path
    /// yields None.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current: Option<&Value> = None;
        for (i, segment) in path.split('.').enumerate() {
            current = match current {
                None if i == 0 => self.0.get(segment),
                Some(Value::Object(map)) => map.get(segment),
                _ => return None,
            };
            current?;
        }
        current
    }

    /// Get a field as a string slice
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Get a field as an unsigned integer
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        self.get(field).and_then(Value::as_u64)
    }

    /// Set a top-level field, returning the previous value if any
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Remove a top-level field
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    /// Whether the document has a top-level field
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read the native identifier, if present and well-formed
    pub fn id(&self) -> Option<DocumentId> {
        self.get_str(NATIVE_ID_FIELD).and_then(DocumentId::from_string)
    }

    /// Assign the native identifier
    pub fn set_id(&mut self, id: DocumentId) {
        self.0
            .insert(NATIVE_ID_FIELD.to_string(), Value::String(id.to_string()));
    }

    /// Merge `other` into this document
    ///
    /// Update semantics for `save`: scalar fields are replaced, nested
    /// objects are merged recursively, arrays are replaced wholesale (never
    /// merged element-wise), and explicit nulls overwrite.
    pub fn deep_merge(&mut self, other: &Document) {
        for (key, incoming) in other.0.iter() {
            match (self.0.get_mut(key), incoming) {
                (Some(Value::Object(existing)), Value::Object(new)) => {
                    merge_maps(existing, new);
                }
                (_, value) => {
                    self.0.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

fn merge_maps(existing: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        match (existing.get_mut(key), value) {
            (Some(Value::Object(sub)), Value::Object(new_sub)) => merge_maps(sub, new_sub),
            (_, v) => {
                existing.insert(key.clone(), v.clone());
            }
        }
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = serde_json::map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
