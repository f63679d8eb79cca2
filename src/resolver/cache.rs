//! Per-invocation reference cache

use std::collections::HashMap;

/// Opaque id to resolved display value.
///
/// Lives as long as the resolver that owns it; nothing is shared or persisted.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCache {
    entries: HashMap<String, String>,
}

impl ReferenceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for an id
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Store a value, replacing any earlier one
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(id.into(), value.into());
    }

    /// Whether an id is cached
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of cached ids
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
