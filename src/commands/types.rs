//! Command options
//!
//! One options struct per generating command. Validation happens before any
//! request is made, so an invalid combination never produces partial output.

use crate::error::{Error, Result};
use crate::query::{parse_filter_pairs, DisplayValue, RelativeDate, TableQuery};
use crate::record::DEFAULT_TIME_FIELD;

/// Upper bound on records an assignment query walks by default
pub const DEFAULT_ASSIGNMENT_LIMIT: u64 = 10_000;

/// Look-back window of the outage command when none is given
pub const DEFAULT_OUTAGE_DAYS: u32 = 30;

/// Columns a report query returns unless all are requested
pub const REPORT_FIELDS: &[&str] = &[
    "assigned_to",
    "assignment_group",
    "business_service",
    "caller_id",
    "category",
    "close_code",
    "closed_at",
    "closed_by",
    "cmdb_ci",
    "contact_type",
    "number",
    "opened_at",
    "opened_by",
    "priority",
    "resolved_at",
    "resolved_by",
    "severity",
    "short_description",
    "state",
    "subcategory",
    "u_incident_duration",
    "sys_created_on",
];

/// A generating command with its options
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free-form table query
    Query(QueryOptions),
    /// Incidents assigned to users or groups
    Incident(AssignmentOptions),
    /// Tasks assigned to users or groups
    Task(AssignmentOptions),
    /// Users with their assets and recently opened incidents
    User(UserOptions),
    /// Recent CI outages
    Outage(OutageOptions),
    /// Incidents matching a saved report's filter
    Report(ReportOptions),
}

impl Command {
    /// Command name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::Incident(_) => "incident",
            Self::Task(_) => "task",
            Self::User(_) => "user",
            Self::Outage(_) => "outage",
            Self::Report(_) => "report",
        }
    }

    /// Reject invalid option combinations
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Query(opts) => opts.validate(),
            Self::Incident(opts) | Self::Task(opts) => opts.validate(),
            Self::User(opts) => opts.validate(),
            Self::Outage(_) => Ok(()),
            Self::Report(opts) => opts.validate(),
        }
    }
}

// ============================================================================
// Query
// ============================================================================

/// Options of the free-form query command
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Table to query
    pub table: String,
    /// `key=value` pairs separated by commas
    pub filters: Option<String>,
    /// Only rows whose `date_field` is at most this many days old
    pub days_ago: Option<u32>,
    /// Only rows whose `date_field` is at or after this GlideSystem expression
    pub glide: Option<String>,
    /// Column the relative-date filter applies to
    pub date_field: String,
    /// Column the event time is read from
    pub time_field: String,
    /// Filter on the `active` column
    pub active: Option<bool>,
    /// Stop requesting pages past this many records
    pub limit: Option<u64>,
    /// Rows per page requested from the API
    pub page_size: Option<u32>,
    /// Only return these columns
    pub fields: Vec<String>,
    /// How the API renders reference fields
    pub display_value: DisplayValue,
    /// Replace references by their raw value before flattening
    pub values_only: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            table: "incident".to_string(),
            filters: None,
            days_ago: None,
            glide: None,
            date_field: "opened_at".to_string(),
            time_field: DEFAULT_TIME_FIELD.to_string(),
            active: None,
            limit: None,
            page_size: None,
            fields: Vec::new(),
            display_value: DisplayValue::default(),
            values_only: false,
        }
    }
}

impl QueryOptions {
    /// Query every row of `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Reject invalid option combinations
    pub fn validate(&self) -> Result<()> {
        if self.days_ago.is_some() && self.glide.is_some() {
            return Err(Error::invalid_option(
                "days_ago",
                "days_ago and glide are mutually exclusive, define only one",
            ));
        }
        if self.table.trim().is_empty() {
            return Err(Error::invalid_option("table", "must not be empty"));
        }
        Ok(())
    }

    /// The table query these options describe
    pub fn table_query(&self) -> Result<TableQuery> {
        self.validate()?;

        let mut query = TableQuery::new(self.table.trim())
            .display_value(self.display_value)
            .fields(self.fields.iter().map(String::as_str));
        if let Some(filters) = &self.filters {
            query = query.filters(parse_filter_pairs(filters)?);
        }
        if let Some(days) = self.days_ago {
            query = query.relative_date(RelativeDate::days_ago(&self.date_field, days));
        }
        if let Some(expr) = &self.glide {
            query = query.relative_date(RelativeDate::glide(&self.date_field, expr));
        }
        if let Some(active) = self.active {
            query = query.active(active);
        }
        if let Some(size) = self.page_size {
            query = query.limit(size);
        }
        Ok(query)
    }
}

// ============================================================================
// Incident / Task
// ============================================================================

/// How the names given to an assignment query are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignedBy {
    /// `sys_user.user_name`, matched against `assigned_to`
    #[default]
    User,
    /// `sys_user_group.name`, matched against `assignment_group`
    Group,
}

impl AssignedBy {
    /// Table the names are looked up in
    pub fn lookup_table(self) -> &'static str {
        match self {
            Self::User => "sys_user",
            Self::Group => "sys_user_group",
        }
    }

    /// Column of the lookup table holding the names
    pub fn lookup_field(self) -> &'static str {
        match self {
            Self::User => "user_name",
            Self::Group => "name",
        }
    }

    /// Column of the queried table holding the sys_id
    pub fn column(self) -> &'static str {
        match self {
            Self::User => "assigned_to",
            Self::Group => "assignment_group",
        }
    }
}

/// Options shared by the incident and task commands
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOptions {
    /// User names or group names
    pub assigned: Vec<String>,
    /// How `assigned` is interpreted
    pub assigned_by: AssignedBy,
    /// Only rows created at most this many days ago
    pub days_ago: Option<u32>,
    /// Filter on the `active` column
    pub active: bool,
    /// Stop requesting pages past this many records
    pub limit: u64,
}

impl Default for AssignmentOptions {
    fn default() -> Self {
        Self {
            assigned: Vec::new(),
            assigned_by: AssignedBy::default(),
            days_ago: None,
            active: true,
            limit: DEFAULT_ASSIGNMENT_LIMIT,
        }
    }
}

impl AssignmentOptions {
    /// Rows assigned to any of `assigned`
    pub fn new<I, S>(assigned: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assigned: assigned.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Reject an empty assignee list
    pub fn validate(&self) -> Result<()> {
        require_values("assigned", &self.assigned)
    }
}

// ============================================================================
// User / Outage / Report
// ============================================================================

/// Options of the user command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOptions {
    /// `sys_user.user_name` values
    pub user_names: Vec<String>,
    /// Only incidents opened at most this many days ago
    pub days_ago: Option<u32>,
}

impl UserOptions {
    /// Reject an empty user list
    pub fn validate(&self) -> Result<()> {
        require_values("user_name", &self.user_names)
    }
}

/// Options of the outage command
#[derive(Debug, Clone, PartialEq)]
pub struct OutageOptions {
    /// Look-back window in days
    pub days_ago: u32,
}

impl Default for OutageOptions {
    fn default() -> Self {
        Self {
            days_ago: DEFAULT_OUTAGE_DAYS,
        }
    }
}

/// Options of the report command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOptions {
    /// Report title (`report_home_details.rep_title`)
    pub report: String,
    /// Return every incident column instead of [`REPORT_FIELDS`]
    pub all_fields: bool,
}

impl ReportOptions {
    /// Reject an empty title
    pub fn validate(&self) -> Result<()> {
        if self.report.trim().is_empty() {
            return Err(Error::invalid_option("report", "a report title is required"));
        }
        Ok(())
    }
}

fn require_values(field: &str, values: &[String]) -> Result<()> {
    if values.iter().all(|v| v.trim().is_empty()) {
        return Err(Error::invalid_option(field, "at least one value is required"));
    }
    Ok(())
}

/// What a command produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandStats {
    /// Events written to the sink, error events included
    pub events: u64,
    /// Table walks started
    pub walks: u32,
}
