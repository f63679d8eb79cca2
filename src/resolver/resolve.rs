//! Reference resolution
//!
//! A reference column holds a sys_id and a REST link to the referenced row.
//! Resolving it means following the link once, reading one field of the
//! returned row, and substituting that value into the record. Every id is
//! fetched at most once per resolver.

use super::cache::ReferenceCache;
use super::types::{ReplacementMap, Resolution, SYSTEM_ID};
use crate::error::Result;
use crate::http::HttpClient;
use crate::pagination::PageWalker;
use crate::query::{DisplayValue, FilterClause, TableQuery};
use crate::record::{Field, RecordEnvelope};
use crate::types::JsonValue;
use tracing::debug;

/// Rows matched by [`ReferenceResolver::lookup_sys_ids`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SysIdLookup {
    /// `sys_id` of every matched row, in response order
    pub sys_ids: Vec<String>,
    /// The matched rows
    pub records: Vec<RecordEnvelope>,
}

/// Resolves reference fields through their links, with a private cache
#[derive(Debug)]
pub struct ReferenceResolver {
    http: HttpClient,
    cache: ReferenceCache,
}

impl ReferenceResolver {
    /// Create a resolver with an empty cache
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            cache: ReferenceCache::new(),
        }
    }

    /// The cache filled so far
    pub fn cache(&self) -> &ReferenceCache {
        &self.cache
    }

    /// Replace `record[target]` with the `remote` field of the row it
    /// references. Failures leave the field untouched.
    pub async fn resolve(
        &mut self,
        record: &mut RecordEnvelope,
        target: &str,
        remote: &str,
    ) -> Resolution {
        let Some(Field::Reference(reference)) = record.get(target) else {
            return Resolution::Unresolved;
        };
        let Some(id) = reference.id().map(str::to_string) else {
            return Resolution::Unresolved;
        };
        let link = reference.link.clone().filter(|l| !l.is_empty());

        if id == SYSTEM_ID {
            record.insert(target, SYSTEM_ID);
            return Resolution::System;
        }

        if let Some(value) = self.cache.get(&id) {
            record.insert(target, value);
            return Resolution::Cached;
        }

        let Some(link) = link else {
            return Resolution::Unresolved;
        };

        match self.fetch_remote_field(&link, remote).await {
            Some(value) => {
                self.cache.insert(id, value.as_str());
                record.insert(target, value);
                Resolution::Fetched
            }
            None => Resolution::Unresolved,
        }
    }

    /// Apply every configured `target=remote` pair to a record
    pub async fn resolve_all(&mut self, record: &mut RecordEnvelope, replacements: &ReplacementMap) {
        for (target, remote) in replacements.iter() {
            let outcome = self.resolve(record, target, remote).await;
            debug!("Resolved '{}' via '{}': {:?}", target, remote, outcome);
        }
    }

    async fn fetch_remote_field(&self, link: &str, remote: &str) -> Option<String> {
        let body: JsonValue = match self.http.get_json(link).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Reference lookup failed for {}: {}", link, e);
                return None;
            }
        };

        let value = body.get("result").and_then(|row| row.get(remote)).cloned();
        let text = value.and_then(|v| Field::from(v).text());
        if text.is_none() {
            debug!("Field '{}' missing from {}", remote, link);
        }
        text
    }

    /// Find the rows of `table` whose `key` equals any of `values`.
    ///
    /// With `map_to`, each match also primes the cache with
    /// `sys_id -> row[map_to]`, so later references to those rows resolve
    /// without a request. A walk that ends on a failed request is an error.
    pub async fn lookup_sys_ids<S: AsRef<str>>(
        &mut self,
        base_url: &str,
        table: &str,
        key: &str,
        values: &[S],
        map_to: Option<&str>,
    ) -> Result<SysIdLookup> {
        let mut lookup = SysIdLookup::default();
        let clause = FilterClause::new(key, values.iter().map(|v| v.as_ref().to_string()));
        if clause.is_empty() {
            return Ok(lookup);
        }

        let url = TableQuery::new(table)
            .filter(clause)
            .display_value(DisplayValue::False)
            .url(base_url);
        let mut walker = PageWalker::new(self.http.clone(), url, None);

        while let Some(sourced) = walker.next_record().await? {
            let record = sourced.record;
            let Some(sys_id) = record.text("sys_id").filter(|s| !s.is_empty()) else {
                continue;
            };
            if let Some(value) = map_to.and_then(|field| record.text(field)) {
                self.cache.insert(sys_id.as_str(), value);
            }
            lookup.sys_ids.push(sys_id);
            lookup.records.push(record);
        }

        if let Some(e) = walker.take_last_error() {
            return Err(e);
        }

        debug!(
            "Matched {} of {} value(s) in {}.{}",
            lookup.sys_ids.len(),
            values.len(),
            table,
            key
        );
        Ok(lookup)
    }
}
