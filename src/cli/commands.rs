//! CLI commands and argument parsing

use crate::commands::{
    AssignedBy, AssignmentOptions, Command, OutageOptions, QueryOptions, ReportOptions,
    UserOptions, DEFAULT_ASSIGNMENT_LIMIT, DEFAULT_OUTAGE_DAYS,
};
use crate::config::DEFAULT_ENVIRONMENT;
use crate::query::DisplayValue;
use crate::record::DEFAULT_TIME_FIELD;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pull ServiceNow table rows as flat JSON events
#[derive(Parser, Debug)]
#[command(name = "snowtap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment config file (YAML)
    #[arg(short = 'C', long, global = true, default_value = "snowtap.yaml")]
    pub config: PathBuf,

    /// Environment stanza to use
    #[arg(short, long, global = true, default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query any table with key=value filters
    Query {
        /// Table to query
        #[arg(short, long, default_value = "incident")]
        table: String,

        /// Comma-separated key=value pairs; repeated keys are OR'd
        #[arg(short, long)]
        filters: Option<String>,

        /// Only rows at most this many days old
        #[arg(long)]
        days_ago: Option<u32>,

        /// GlideSystem expression for the lower date bound, e.g. beginningOfLastWeek()
        #[arg(long)]
        glide: Option<String>,

        /// Column the date filter applies to
        #[arg(long, default_value = "opened_at")]
        date_field: String,

        /// Column the event time is read from
        #[arg(long, default_value = DEFAULT_TIME_FIELD)]
        time_field: String,

        /// Filter on the active column
        #[arg(long)]
        active: Option<bool>,

        /// Stop requesting pages past this many records
        #[arg(long)]
        limit: Option<u64>,

        /// Rows per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Columns to return (comma-separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Reference rendering: true, false or all
        #[arg(long, default_value = "true")]
        display_value: DisplayValue,

        /// Replace references by their raw value
        #[arg(long)]
        values_only: bool,
    },

    /// Incidents assigned to users or groups
    Incident(AssignmentArgs),

    /// Tasks assigned to users or groups
    Task(AssignmentArgs),

    /// Users, their assets, and incidents they opened
    User {
        /// User names (comma-separated)
        #[arg(short, long, value_delimiter = ',', required = true)]
        user_name: Vec<String>,

        /// Only incidents opened at most this many days ago
        #[arg(long)]
        days_ago: Option<u32>,
    },

    /// Recent CI outages
    Outage {
        /// Look-back window in days
        #[arg(long, default_value_t = DEFAULT_OUTAGE_DAYS)]
        days_ago: u32,
    },

    /// Incidents matching a saved report
    Report {
        /// Report title
        #[arg(short, long)]
        report: String,

        /// Return every incident column
        #[arg(long)]
        all_fields: bool,
    },
}

/// Arguments of the incident and task commands
#[derive(Args, Debug)]
pub struct AssignmentArgs {
    /// User names or group names (comma-separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub assigned: Vec<String>,

    /// Interpret names as users or groups
    #[arg(long, value_enum, default_value = "user")]
    pub assigned_by: AssignedByArg,

    /// Only rows created at most this many days ago
    #[arg(long)]
    pub days_ago: Option<u32>,

    /// Filter on the active column
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub active: bool,

    /// Stop requesting pages past this many records
    #[arg(long, default_value_t = DEFAULT_ASSIGNMENT_LIMIT)]
    pub limit: u64,
}

/// Assignee kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AssignedByArg {
    /// sys_user.user_name
    User,
    /// sys_user_group.name
    Group,
}

impl From<AssignedByArg> for AssignedBy {
    fn from(arg: AssignedByArg) -> Self {
        match arg {
            AssignedByArg::User => Self::User,
            AssignedByArg::Group => Self::Group,
        }
    }
}

impl From<&AssignmentArgs> for AssignmentOptions {
    fn from(args: &AssignmentArgs) -> Self {
        Self {
            assigned: args.assigned.clone(),
            assigned_by: args.assigned_by.into(),
            days_ago: args.days_ago,
            active: args.active,
            limit: args.limit,
        }
    }
}

impl Commands {
    /// The library command these arguments describe
    pub fn to_command(&self) -> Command {
        match self {
            Self::Query {
                table,
                filters,
                days_ago,
                glide,
                date_field,
                time_field,
                active,
                limit,
                page_size,
                fields,
                display_value,
                values_only,
            } => Command::Query(QueryOptions {
                table: table.clone(),
                filters: filters.clone(),
                days_ago: *days_ago,
                glide: glide.clone(),
                date_field: date_field.clone(),
                time_field: time_field.clone(),
                active: *active,
                limit: *limit,
                page_size: *page_size,
                fields: fields.clone(),
                display_value: *display_value,
                values_only: *values_only,
            }),
            Self::Incident(args) => Command::Incident(args.into()),
            Self::Task(args) => Command::Task(args.into()),
            Self::User {
                user_name,
                days_ago,
            } => Command::User(UserOptions {
                user_names: user_name.clone(),
                days_ago: *days_ago,
            }),
            Self::Outage { days_ago } => Command::Outage(OutageOptions {
                days_ago: *days_ago,
            }),
            Self::Report { report, all_fields } => Command::Report(ReportOptions {
                report: report.clone(),
                all_fields: *all_fields,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_global_defaults() {
        let cli = parse(&["snowtap", "outage"]);
        assert_eq!(cli.env, "production");
        assert_eq!(cli.config, PathBuf::from("snowtap.yaml"));
        assert!(!cli.verbose);
        assert_eq!(
            cli.command.to_command(),
            Command::Outage(OutageOptions { days_ago: 30 })
        );
    }

    #[test]
    fn test_incident_args() {
        let cli = parse(&[
            "snowtap",
            "--env",
            "staging",
            "incident",
            "--assigned",
            "fred.luddy,beth.anglin",
            "--assigned-by",
            "group",
            "--active",
            "false",
            "--days-ago",
            "7",
        ]);
        assert_eq!(cli.env, "staging");

        let Command::Incident(opts) = cli.command.to_command() else {
            panic!("Expected incident");
        };
        assert_eq!(opts.assigned, vec!["fred.luddy", "beth.anglin"]);
        assert_eq!(opts.assigned_by, AssignedBy::Group);
        assert!(!opts.active);
        assert_eq!(opts.days_ago, Some(7));
        assert_eq!(opts.limit, 10_000);
    }

    #[test]
    fn test_query_args() {
        let cli = parse(&[
            "snowtap",
            "query",
            "--table",
            "problem",
            "--filters",
            "priority=1",
            "--fields",
            "number,state",
            "--display-value",
            "all",
            "--values-only",
        ]);

        let Command::Query(opts) = cli.command.to_command() else {
            panic!("Expected query");
        };
        assert_eq!(opts.table, "problem");
        assert_eq!(opts.filters.as_deref(), Some("priority=1"));
        assert_eq!(opts.fields, vec!["number", "state"]);
        assert_eq!(opts.display_value, DisplayValue::All);
        assert!(opts.values_only);
        assert_eq!(opts.time_field, "sys_created_on");
    }

    #[test]
    fn test_user_requires_names() {
        assert!(Cli::try_parse_from(["snowtap", "user"]).is_err());
    }
}
