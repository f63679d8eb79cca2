//! Resolver types

use std::collections::BTreeMap;

/// Identifier that always renders as itself
pub const SYSTEM_ID: &str = "system";

/// Outcome of resolving one reference field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The `system` sentinel, substituted without lookup
    System,
    /// Substituted from the cache
    Cached,
    /// Fetched through the link, cached, and substituted
    Fetched,
    /// Left untouched
    Unresolved,
}

impl Resolution {
    /// Whether the field was substituted
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Reference fields to resolve: record key to the remote field whose value
/// replaces it, e.g. `assigned_to` to `user_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMap {
    pairs: BTreeMap<String, String>,
}

impl ReplacementMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"assigned_to=user_name, assignment_group=name"`.
    ///
    /// Entries without `=` or with an empty side are skipped.
    pub fn parse(input: &str) -> Self {
        input
            .split(',')
            .filter_map(|entry| entry.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect()
    }

    /// Add a pair
    pub fn insert(&mut self, target: impl Into<String>, remote: impl Into<String>) {
        self.pairs.insert(target.into(), remote.into());
    }

    /// Remote field configured for a record key
    pub fn get(&self, target: &str) -> Option<&str> {
        self.pairs.get(target).map(String::as_str)
    }

    /// Iterate `(target, remote)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether nothing is configured
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplacementMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
