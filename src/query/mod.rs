//! Query builder module
//!
//! Renders the table API's encoded-query grammar: `^` between AND clauses,
//! `^OR` between the values of one clause, a relative-date clause backed by
//! a GlideSystem call, and the `active` flag.
//!
//! # Overview
//!
//! - `FilterClause` - one field matched against any of several values
//! - `TableQuery` - clauses plus flags, rendered into a request URL
//! - `parse_filter_pairs` - `k=v,k=v2` command-line filters into clauses

mod builder;
mod types;

pub use builder::{build_filter_clause, parse_filter_pairs, TableQuery};
pub use types::{DateFilter, DisplayValue, FilterClause, RelativeDate};

#[cfg(test)]
mod tests;
