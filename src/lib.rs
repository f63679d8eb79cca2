// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # snowtap
//!
//! Pulls rows from a ServiceNow-style REST table API and turns them into
//! flat, timestamped JSON events for a search/analytics pipeline.
//!
//! ## Features
//!
//! - **Query Building**: `^`/`^OR` encoded queries, relative-date and glide clauses
//! - **Link Pagination**: follows `rel="next"` under a 10,000 row ceiling and an optional limit
//! - **Reference Resolution**: follows reference links once per id, memoised per invocation
//! - **Flattening**: dot-path string fields with an explicit empty-leaf policy
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snowtap::commands::{AssignmentOptions, Command, Session};
//! use snowtap::config::ConfigFile;
//!
//! #[tokio::main]
//! async fn main() -> snowtap::Result<()> {
//!     let env = ConfigFile::from_file("snowtap.yaml")?.environment("production")?;
//!     let mut session = Session::new(&env)?;
//!
//!     let mut events = Vec::new();
//!     let command = Command::Incident(AssignmentOptions::new(["fred.luddy"]));
//!     session.run(&command, &mut events).await?;
//!
//!     for event in &events {
//!         println!("{}", event.to_json_line());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │        Commands: query, incident, task, user, outage, report │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴───┬─────────────┬─────────────┐
//! │   Query    │    Pagination      │  Resolver   │   Record    │
//! ├────────────┼────────────────────┼─────────────┼─────────────┤
//! │ Clauses    │ Link rel="next"    │ Link follow │ Flatten     │
//! │ daysAgo    │ X-Total-Count      │ Id cache    │ _time       │
//! │ active     │ Limit / ceiling    │ sys_id map  │ _raw        │
//! └────────────┴────────────────────┴─────────────┴─────────────┘
//!                               │
//!                   HTTP: basic auth, timeout, proxy
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Basic authentication
pub mod auth;

/// HTTP client with timeout, proxy and rate limiting
pub mod http;

/// Encoded query construction
pub mod query;

/// Link-header pagination
pub mod pagination;

/// Reference field resolution and caching
pub mod resolver;

/// Record model, flattening and events
pub mod record;

/// Environment configuration
pub mod config;

/// Generating commands
pub mod commands;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use commands::{Command, Session};
pub use config::{ConfigFile, Environment};
pub use record::Event;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
