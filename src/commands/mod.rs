//! Generating commands
//!
//! Each command builds one or more table queries, walks them, resolves the
//! configured reference fields and hands flat events to an [`EventSink`].
//!
//! # Commands
//!
//! - `query` - any table, `key=value` filters, relative date or glide expression
//! - `incident` / `task` - rows assigned to named users or groups
//! - `user` - users, then their assets, then incidents they opened
//! - `outage` - recent `cmdb_ci_outage` rows
//! - `report` - incidents matching a saved report's stored filter
//!
//! A command that cannot produce anything (bad options, unreachable
//! instance, rejected credentials) emits exactly one error event instead.

mod session;
mod sink;
mod types;

pub use session::{emit_failure, run, Session};
pub use sink::{EventSink, JsonLinesSink};
pub use types::{
    AssignedBy, AssignmentOptions, Command, CommandStats, OutageOptions, QueryOptions,
    ReportOptions, UserOptions, DEFAULT_ASSIGNMENT_LIMIT, DEFAULT_OUTAGE_DAYS, REPORT_FIELDS,
};
