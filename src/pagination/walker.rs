//! Pull-based page walker
//!
//! One request is in flight at most, and only when the caller asks for a
//! record the buffered page cannot supply.

use super::types::{next_page, total_count, NextPage, PaginationState, SourcedRecord, StopReason};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::record::RecordEnvelope;
use crate::types::JsonValue;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Lazily walks the pages of one table query
#[derive(Debug)]
pub struct PageWalker {
    client: HttpClient,
    next_url: Option<String>,
    limit: Option<u64>,
    buffer: VecDeque<SourcedRecord>,
    state: PaginationState,
    last_error: Option<Error>,
}

impl PageWalker {
    /// Walk from `url`. With a `limit`, no page starting past that many
    /// records is requested; pages are never truncated.
    pub fn new(client: HttpClient, url: impl Into<String>, limit: Option<u64>) -> Self {
        Self {
            client,
            next_url: Some(url.into()),
            limit,
            buffer: VecDeque::new(),
            state: PaginationState::new(),
            last_error: None,
        }
    }

    /// Next record, fetching the next page when the buffer is empty.
    ///
    /// A failed request ends the walk with `Ok(None)`; see [`Self::last_error`].
    /// A page body that is not a `result` array is an error.
    pub async fn next_record(&mut self) -> Result<Option<SourcedRecord>> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.state.records += 1;
                return Ok(Some(record));
            }
            let Some(url) = self.next_url.take() else {
                return Ok(None);
            };
            self.fetch_page(url).await?;
        }
    }

    async fn fetch_page(&mut self, url: String) -> Result<()> {
        self.state.pages += 1;
        debug!("Fetching page {}: {}", self.state.pages, url);

        let response = match self.client.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(e);
                return Ok(());
            }
        };

        let headers = response.headers().clone();
        let total = total_count(&headers);
        self.state.total_count = total;

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                self.fail(Error::Http(e));
                return Ok(());
            }
        };
        let body: JsonValue =
            serde_json::from_str(&text).map_err(|e| Error::decode(&url, e.to_string()))?;

        for record in extract_results(body, &url)? {
            self.buffer.push_back(SourcedRecord {
                record,
                source: url.clone(),
                total_count: total,
            });
        }

        match next_page(&headers, self.limit) {
            NextPage::Continue { url } => self.next_url = Some(url),
            NextPage::Done(reason) => {
                debug!("Pagination stopped after {} page(s): {:?}", self.state.pages, reason);
                self.state.mark_done(reason);
            }
        }
        Ok(())
    }

    fn fail(&mut self, error: Error) {
        warn!("Page request failed, ending walk: {}", error);
        self.state.mark_done(StopReason::Failed);
        self.last_error = Some(error);
    }

    /// The error that ended the walk, if one did
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Take the error that ended the walk
    pub fn take_last_error(&mut self) -> Option<Error> {
        self.last_error.take()
    }

    /// Progress so far
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Why the walk stopped, once it has
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.state.stop
    }

    /// Convert into a stream of records. The stream ends after the first
    /// decode error it yields.
    pub fn into_stream(self) -> impl Stream<Item = Result<SourcedRecord>> {
        stream::unfold(Some(self), |walker| async move {
            let mut walker = walker?;
            match walker.next_record().await {
                Ok(Some(record)) => Some((Ok(record), Some(walker))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Pull the `result` rows out of a page body. A body without `result` is an
/// empty page.
fn extract_results(body: JsonValue, url: &str) -> Result<Vec<RecordEnvelope>> {
    let JsonValue::Object(mut map) = body else {
        return Err(Error::decode(url, "response body is not a JSON object"));
    };

    match map.remove("result") {
        None => {
            debug!("No result array in response from {}", url);
            Ok(Vec::new())
        }
        Some(JsonValue::Array(rows)) => rows
            .into_iter()
            .map(|row| match row {
                JsonValue::Object(fields) => Ok(RecordEnvelope::from(fields)),
                other => Err(Error::decode(url, format!("result row is not an object: {other}"))),
            })
            .collect(),
        Some(other) => Err(Error::decode(
            url,
            format!("result is not an array: {other}"),
        )),
    }
}
