//! Reference resolution
//!
//! # Overview
//!
//! - `ReferenceResolver` - follows reference links and substitutes one field
//!   of the referenced row, memoised by id in a `ReferenceCache`
//! - `ReplacementMap` - which record keys to resolve, and through which field
//! - `lookup_sys_ids` - the reverse direction: names to sys_ids, priming the
//!   cache on the way

mod cache;
mod resolve;
mod types;

pub use cache::ReferenceCache;
pub use resolve::{ReferenceResolver, SysIdLookup};
pub use types::{ReplacementMap, Resolution, SYSTEM_ID};

#[cfg(test)]
mod tests;
