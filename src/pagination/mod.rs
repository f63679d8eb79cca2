//! Pagination over the table API
//!
//! # Overview
//!
//! Pages are followed through the `Link: <...>; rel="next"` header. A walk
//! stops when there is no next link, when the advertised `X-Total-Count`
//! exceeds [`TOTAL_COUNT_CEILING`], or when the next link's offset passes the
//! caller's limit. A failed request ends the walk quietly; records already
//! yielded stay valid.

mod types;
mod walker;

pub use types::{
    link_offset, next_page, parse_link_header, total_count, NextPage, PaginationState,
    SourcedRecord, StopReason, LINK_HEADER, TOTAL_COUNT_CEILING, TOTAL_COUNT_HEADER,
};
pub use walker::PageWalker;

#[cfg(test)]
mod tests;
