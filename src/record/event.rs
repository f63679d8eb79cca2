//! Consumer-facing events
//!
//! An event is the flattened record plus `_time`, `source`, `sourcetype` and
//! `_raw`. `_time` stays numeric; every other flattened value is a string.

use super::normalize::{parse_timestamp, update_time, Flattener, NullPolicy};
use super::types::RecordEnvelope;
use crate::types::{JsonObject, JsonValue};
use serde::Serialize;

/// Column the event time is read from
pub const DEFAULT_TIME_FIELD: &str = "sys_created_on";

/// Key carrying the total-count hint of the page a record came from
pub const TOTAL_COUNT_KEY: &str = "X-Total-Count";

/// Suffix of the numeric companion of a timestamp column
pub const EPOCH_SUFFIX: &str = ".epoch";

/// Lifecycle timestamps the query command also emits as epoch seconds
pub const LIFECYCLE_TIME_FIELDS: [&str; 3] = ["sys_created_on", "resolved_at", "sys_updated_on"];

/// A flat, timestamped record ready for the consumer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Event {
    fields: JsonObject,
}

impl Event {
    /// A single error event, used when nothing else can be emitted
    pub fn error(message: impl Into<String>, url: Option<&str>) -> Self {
        let mut fields = JsonObject::new();
        fields.insert("error".into(), JsonValue::String(message.into()));
        if let Some(url) = url {
            fields.insert("url".into(), JsonValue::String(url.to_string()));
        }
        let raw = to_pretty_json(&fields);
        fields.insert("_raw".into(), JsonValue::String(raw));
        Self { fields }
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    /// Get a string field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    /// Whether this is an error event
    pub fn is_error(&self) -> bool {
        self.fields.contains_key("error")
    }

    /// All fields
    pub fn fields(&self) -> &JsonObject {
        &self.fields
    }

    /// Serialize as a single JSON line
    pub fn to_json_line(&self) -> String {
        JsonValue::Object(self.fields.clone()).to_string()
    }
}

/// Pretty, key-sorted JSON used for `_raw`
pub fn to_pretty_json(fields: &JsonObject) -> String {
    serde_json::to_string_pretty(fields).unwrap_or_default()
}

/// Turns raw records into events for one sourcetype
#[derive(Debug, Clone)]
pub struct EventBuilder {
    sourcetype: String,
    flattener: Flattener,
    time_field: String,
    epoch_fields: Vec<String>,
}

impl EventBuilder {
    /// Events tagged with `sourcetype`, flattened with `policy`
    pub fn new(sourcetype: impl Into<String>, policy: NullPolicy) -> Self {
        Self {
            sourcetype: sourcetype.into(),
            flattener: Flattener::new(policy),
            time_field: DEFAULT_TIME_FIELD.to_string(),
            epoch_fields: Vec::new(),
        }
    }

    /// Read the event time from another column
    #[must_use]
    pub fn time_field(mut self, field: impl Into<String>) -> Self {
        self.time_field = field.into();
        self
    }

    /// Also emit `<field>.epoch` as epoch seconds for each of these columns.
    /// Columns that are missing or unparseable get no companion.
    #[must_use]
    pub fn epoch_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.epoch_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sourcetype stamped on every event
    pub fn sourcetype(&self) -> &str {
        &self.sourcetype
    }

    /// Empty-leaf policy in use
    pub fn policy(&self) -> NullPolicy {
        self.flattener.policy()
    }

    /// Build an event from a record fetched from `source`
    pub fn build(&self, mut record: RecordEnvelope, source: &str, total_count: Option<u64>) -> Event {
        record.insert("sourcetype", self.sourcetype.as_str());
        record.insert("source", source);
        if let Some(total) = total_count {
            record.insert(TOTAL_COUNT_KEY, total.to_string());
        }
        let epoch = update_time(&mut record, &self.time_field, "_time");
        let companions: Vec<(String, i64)> = self
            .epoch_fields
            .iter()
            .filter_map(|field| {
                let secs = record.text(field).as_deref().and_then(parse_timestamp)?;
                Some((format!("{field}{EPOCH_SUFFIX}"), secs))
            })
            .collect();
        for (key, secs) in &companions {
            record.insert(key.as_str(), *secs);
        }

        let raw = to_pretty_json(&record.to_json());
        // numeric values bypass flattening
        record.remove("_time");
        for (key, _) in &companions {
            record.remove(key);
        }

        let mut fields: JsonObject = self
            .flattener
            .flatten(&record)
            .into_iter()
            .map(|(k, v)| (k, JsonValue::String(v)))
            .collect();
        fields.insert(
            "_time".into(),
            epoch.map_or_else(|| JsonValue::String(String::new()), JsonValue::from),
        );
        for (key, secs) in companions {
            fields.insert(key, JsonValue::from(secs));
        }
        fields.insert("_raw".into(), JsonValue::String(raw));

        Event { fields }
    }
}
