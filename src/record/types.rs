//! Record envelope types
//!
//! The table API wraps fields in one of three shapes: a bare value, a
//! `{value, display_value, link}` reference to another table's row, or (for
//! dot-walked fields) a nested object. [`Field`] makes that explicit.

use crate::types::{JsonObject, JsonValue, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keys a reference object may carry
const REFERENCE_KEYS: [&str; 3] = ["value", "display_value", "link"];

/// Pointer to a row of another table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    /// Opaque identifier (a sys_id, or `system`)
    pub value: Option<String>,
    /// Human-readable rendering chosen by the API
    pub display_value: Option<String>,
    /// REST URL of the referenced row
    pub link: Option<String>,
}

impl Reference {
    /// Identifier used as the cache key: `value`, or the last path segment
    /// of `link` (`.../sys_user/<sys_id>`) when the API returned display
    /// values only.
    pub fn id(&self) -> Option<&str> {
        non_empty(self.value.as_deref())
            .or_else(|| non_empty(self.link.as_deref()).and_then(link_sys_id))
    }

    /// Whether the reference points somewhere that can be fetched
    pub fn is_resolvable(&self) -> bool {
        non_empty(self.link.as_deref()).is_some()
    }

    /// Best textual rendering: `value`, else `display_value`
    pub fn text(&self) -> Option<&str> {
        non_empty(self.value.as_deref()).or_else(|| non_empty(self.display_value.as_deref()))
    }

    /// Components in wire order, skipping absent ones
    pub fn components(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("value", self.value.as_deref()),
            ("display_value", self.display_value.as_deref()),
            ("link", self.link.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, v)| v.map(|v| (key, v)))
    }

    fn from_object(map: &JsonObject) -> Option<Self> {
        if map.is_empty() || !map.keys().all(|k| REFERENCE_KEYS.contains(&k.as_str())) {
            return None;
        }
        let mut reference = Reference::default();
        for (key, value) in map {
            let text = match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(s.clone()),
                JsonValue::Bool(_) | JsonValue::Number(_) => Some(value.to_string()),
                JsonValue::Array(_) | JsonValue::Object(_) => return None,
            };
            match key.as_str() {
                "value" => reference.value = text,
                "display_value" => reference.display_value = text,
                _ => reference.link = text,
            }
        }
        Some(reference)
    }

    fn to_json(&self) -> JsonValue {
        let map: JsonObject = self
            .components()
            .map(|(k, v)| (k.to_string(), JsonValue::String(v.to_string())))
            .collect();
        JsonValue::Object(map)
    }
}

/// Row id at the end of a reference link, ignoring any query string
fn link_sys_id(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// One field of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum Field {
    /// A plain value, including `null`, arrays and the empty string
    Scalar(JsonValue),
    /// A link to another table's row
    Reference(Reference),
    /// Any other object
    Nested(RecordEnvelope),
}

impl Field {
    /// Text of a scalar, or of a reference's value
    pub fn text(&self) -> Option<String> {
        match self {
            Field::Scalar(JsonValue::String(s)) => Some(s.clone()),
            Field::Scalar(v @ (JsonValue::Number(_) | JsonValue::Bool(_))) => Some(v.to_string()),
            Field::Reference(r) => r.text().map(str::to_string),
            _ => None,
        }
    }

    /// The reference, when this field is one
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Field::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Whether this is a reference
    pub fn is_reference(&self) -> bool {
        matches!(self, Field::Reference(_))
    }
}

impl From<JsonValue> for Field {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => match Reference::from_object(&map) {
                Some(reference) => Field::Reference(reference),
                None => Field::Nested(RecordEnvelope::from(map)),
            },
            other => Field::Scalar(other),
        }
    }
}

impl From<Field> for JsonValue {
    fn from(field: Field) -> Self {
        match field {
            Field::Scalar(v) => v,
            Field::Reference(r) => r.to_json(),
            Field::Nested(record) => JsonValue::Object(record.to_json()),
        }
    }
}

impl From<&str> for Field {
    fn from(s: &str) -> Self {
        Field::Scalar(JsonValue::String(s.to_string()))
    }
}

impl From<String> for Field {
    fn from(s: String) -> Self {
        Field::Scalar(JsonValue::String(s))
    }
}

impl From<i64> for Field {
    fn from(n: i64) -> Self {
        Field::Scalar(JsonValue::from(n))
    }
}

impl From<u64> for Field {
    fn from(n: u64) -> Self {
        Field::Scalar(JsonValue::from(n))
    }
}

/// One row as returned by the table API, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordEnvelope {
    fields: BTreeMap<String, Field>,
}

impl RecordEnvelope {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a record from already flattened string fields
    pub fn from_flat(flat: &StringMap) -> Self {
        flat.iter()
            .map(|(k, v)| (k.clone(), Field::from(v.as_str())))
            .collect()
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    /// Text of a field, see [`Field::text`]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Field::text)
    }

    /// Set a field, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, field: impl Into<Field>) -> Option<Field> {
        self.fields.insert(key.into(), field.into())
    }

    /// Remove a field
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.fields.remove(key)
    }

    /// Whether the record has a field
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterate fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    /// Iterate fields mutably in key order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Field)> {
        self.fields.iter_mut()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Back to the wire shape
    pub fn to_json(&self) -> JsonObject {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::from(v.clone())))
            .collect()
    }
}

impl From<JsonObject> for RecordEnvelope {
    fn from(map: JsonObject) -> Self {
        map.into_iter()
            .map(|(k, v)| (k, Field::from(v)))
            .collect()
    }
}

impl FromIterator<(String, Field)> for RecordEnvelope {
    fn from_iter<T: IntoIterator<Item = (String, Field)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
