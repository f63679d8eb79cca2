//! Record normalization
//!
//! Flattening into dot-path keys, timestamp conversion, and collapsing
//! references to their raw value.

use super::types::{Field, RecordEnvelope};
use crate::types::{JsonValue, StringMap};
use chrono::NaiveDateTime;
use tracing::debug;

/// Flattened record: dot-joined path to string value
pub type FlatRecord = StringMap;

/// Placeholder stored for empty leaves
pub const NULL_SENTINEL: &str = "null";

/// Timestamp layout used by the table API
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What an empty leaf turns into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// `key = "null"`
    #[default]
    Plain,
    /// `key`, `key.display_value` and `key.link` all `"null"`, so an unset
    /// reference column has the same keys as a populated one
    WithSiblings,
}

/// Recursive dot-path flattener
#[derive(Debug, Clone, Copy, Default)]
pub struct Flattener {
    policy: NullPolicy,
}

impl Flattener {
    /// Create a flattener with the given empty-leaf policy
    pub fn new(policy: NullPolicy) -> Self {
        Self { policy }
    }

    /// The empty-leaf policy in use
    pub fn policy(&self) -> NullPolicy {
        self.policy
    }

    /// Flatten a record
    pub fn flatten(&self, record: &RecordEnvelope) -> FlatRecord {
        let mut out = FlatRecord::new();
        self.flatten_into(record, None, &mut out);
        out
    }

    fn flatten_into(&self, record: &RecordEnvelope, prefix: Option<&str>, out: &mut FlatRecord) {
        for (key, field) in record.iter() {
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };
            match field {
                Field::Nested(inner) => self.flatten_into(inner, Some(&path), out),
                Field::Reference(reference) => {
                    for (component, value) in reference.components() {
                        let text = if value.is_empty() { NULL_SENTINEL } else { value };
                        out.insert(format!("{path}.{component}"), text.to_string());
                    }
                }
                Field::Scalar(value) => match leaf_text(value) {
                    Some(text) => {
                        out.insert(path, text);
                    }
                    None => self.insert_null(path, out),
                },
            }
        }
    }

    fn insert_null(&self, path: String, out: &mut FlatRecord) {
        if self.policy == NullPolicy::WithSiblings {
            out.insert(format!("{path}.display_value"), NULL_SENTINEL.to_string());
            out.insert(format!("{path}.link"), NULL_SENTINEL.to_string());
        }
        out.insert(path, NULL_SENTINEL.to_string());
    }
}

/// Text of a non-empty leaf. `null`, `""` and `[]` count as empty.
fn leaf_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::Array(items) if items.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Parse an API timestamp as UTC epoch seconds
pub fn parse_timestamp(text: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Store `record[field]` as epoch seconds at `dest`, or `""` when the field
/// is missing or unparseable.
pub fn update_time(record: &mut RecordEnvelope, field: &str, dest: &str) -> Option<i64> {
    let epoch = record.text(field).and_then(|text| {
        let parsed = parse_timestamp(&text);
        if parsed.is_none() {
            debug!("Unparseable timestamp in '{}': {:?}", field, text);
        }
        parsed
    });

    match epoch {
        Some(secs) => record.insert(dest, secs),
        None => record.insert(dest, ""),
    };
    epoch
}

/// Replace every reference with its raw value
pub fn collapse_references(record: &mut RecordEnvelope) {
    for (_, field) in record.iter_mut() {
        if let Field::Reference(reference) = field {
            let text = reference.text().unwrap_or_default().to_string();
            *field = Field::from(text);
        }
    }
}
