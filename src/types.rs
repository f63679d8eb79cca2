//! Common types used throughout snowtap

use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Ordered key-value map with string keys and values
pub type StringMap = BTreeMap<String, String>;

// ============================================================================
// Source Types
// ============================================================================

/// Default sourcetype for generic table queries
pub const SOURCETYPE_DEFAULT: &str = "snow";
/// Sourcetype for incident rows
pub const SOURCETYPE_INCIDENT: &str = "snow:incident";
/// Sourcetype for catalog task rows
pub const SOURCETYPE_TASK: &str = "snow:task";
/// Sourcetype for user rows
pub const SOURCETYPE_USER: &str = "snow:user";
/// Sourcetype for asset rows
pub const SOURCETYPE_ASSET: &str = "snow:asset";
/// Sourcetype for outage rows
pub const SOURCETYPE_OUTAGE: &str = "snow:outage";

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
