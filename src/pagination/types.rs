//! Pagination types
//!
//! Everything the walker decides about the next page comes from two response
//! headers: `X-Total-Count` and the RFC 5988 `Link` header.

use crate::record::RecordEnvelope;
use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::LazyLock;

/// Above this many matching rows the walker stops after the current page
pub const TOTAL_COUNT_CEILING: u64 = 10_000;

/// Header carrying the number of rows matching the query
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Header carrying the continuation links
pub const LINK_HEADER: &str = "link";

/// Offset parameter inside continuation links
static OFFSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sysparm_offset=(\d+)").expect("valid offset regex"));

/// A record together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    /// The row
    pub record: RecordEnvelope,
    /// Exact URL of the page request that returned the row
    pub source: String,
    /// `X-Total-Count` of that page, when advertised
    pub total_count: Option<u64>,
}

/// Why a walk stopped requesting pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no `rel="next"` link
    NoNextLink,
    /// The next link's offset went past the caller's limit
    LimitReached {
        /// Offset of the page that was not requested
        offset: u64,
    },
    /// The total-count hint exceeded [`TOTAL_COUNT_CEILING`]
    CeilingExceeded {
        /// Advertised total
        total: u64,
    },
    /// A page request failed
    Failed,
}

/// Result of inspecting a page's headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Request this URL next
    Continue {
        /// Continuation URL
        url: String,
    },
    /// No further requests
    Done(StopReason),
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Check if this is a continue result
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue { .. })
    }
}

/// Tracks progress of one walk
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages requested so far
    pub pages: u32,
    /// Records handed to the caller so far
    pub records: u64,
    /// Last advertised total-count hint
    pub total_count: Option<u64>,
    /// Set once no further page will be requested
    pub stop: Option<StopReason>,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the walk has stopped requesting pages
    pub fn is_done(&self) -> bool {
        self.stop.is_some()
    }

    /// Mark pagination as complete
    pub fn mark_done(&mut self, reason: StopReason) {
        self.stop = Some(reason);
    }
}

/// Read the total-count hint
pub fn total_count(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// `sysparm_offset` of a continuation URL
pub fn link_offset(url: &str) -> Option<u64> {
    OFFSET_REGEX
        .captures(url)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decide whether to request another page.
///
/// Checked in order: continuation link present, safety ceiling, caller limit.
pub fn next_page(headers: &HeaderMap, limit: Option<u64>) -> NextPage {
    let Some(url) = headers
        .get(LINK_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| parse_link_header(h, "next"))
    else {
        return NextPage::Done(StopReason::NoNextLink);
    };

    if let Some(total) = total_count(headers).filter(|t| *t > TOTAL_COUNT_CEILING) {
        return NextPage::Done(StopReason::CeilingExceeded { total });
    }

    if let Some(limit) = limit {
        let offset = link_offset(&url).unwrap_or(0);
        if offset > limit {
            return NextPage::Done(StopReason::LimitReached { offset });
        }
    }

    NextPage::Continue { url }
}

/// Parse a Link header and extract the URL for the given rel.
///
/// URLs are taken between angle brackets rather than by splitting on commas,
/// since `sysparm_fields` lists may carry unencoded commas.
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    // Link header format: <url>; rel="next", <url>; rel="prev"
    let mut rest = header;
    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let end = after.find('>')?;
        let url = &after[..end];
        let tail = &after[end + 1..];
        let params = tail.find('<').map_or(tail, |i| &tail[..i]);

        let matched = params
            .split(';')
            .filter_map(|p| p.trim().trim_end_matches(',').trim().strip_prefix("rel="))
            .any(|rel| {
                rel.trim_matches('"')
                    .trim_matches('\'')
                    .split_whitespace()
                    .any(|r| r == target_rel)
            });
        if matched {
            return Some(url.to_string());
        }

        rest = tail;
    }

    None
}
