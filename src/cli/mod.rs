//! CLI module
//!
//! Command-line front end for the generating commands.
//!
//! # Commands
//!
//! - `query` - Any table with key=value filters
//! - `incident` / `task` - Rows assigned to users or groups
//! - `user` - Users, their assets and opened incidents
//! - `outage` - Recent CI outages
//! - `report` - Incidents matching a saved report

mod commands;
mod runner;

pub use commands::{AssignedByArg, AssignmentArgs, Cli, Commands};
pub use runner::Runner;
