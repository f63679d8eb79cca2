//! Query building blocks

use crate::error::Error;
use std::fmt;
use std::str::FromStr;

/// One AND-level term: `field` equal to any of `values`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    /// Field name
    pub field: String,
    /// Accepted values, OR'd together
    pub values: Vec<String>,
}

impl FilterClause {
    /// Create a clause from a field and its accepted values
    pub fn new<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Render as `field=v1^ORfield=v2`, or an empty string when no value
    /// survives trimming.
    pub fn render(&self) -> String {
        let field = self.field.trim();
        self.values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(|v| format!("{field}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("^OR")
    }

    /// Whether the clause renders to nothing
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| v.trim().is_empty())
    }
}

/// How far back a relative-date clause reaches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFilter {
    /// `gs.daysAgo(N)`
    DaysAgo(u32),
    /// Any other GlideSystem expression, e.g. `beginningOfLastWeek()`
    Glide(String),
}

/// `<field> >= javascript:gs.<expr>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeDate {
    /// Date field the filter applies to
    pub field: String,
    /// Lower bound
    pub filter: DateFilter,
}

impl RelativeDate {
    /// Records whose `field` is at most `days` days old
    pub fn days_ago(field: impl Into<String>, days: u32) -> Self {
        Self {
            field: field.into(),
            filter: DateFilter::DaysAgo(days),
        }
    }

    /// Records whose `field` is at or after a GlideSystem expression
    pub fn glide(field: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            filter: DateFilter::Glide(expr.into()),
        }
    }

    /// Render the clause
    pub fn render(&self) -> String {
        let field = self.field.trim();
        match &self.filter {
            DateFilter::DaysAgo(days) => format!("{field}>=javascript:gs.daysAgo({days})"),
            DateFilter::Glide(expr) => {
                let expr = expr.trim().trim_start_matches("gs.");
                format!("{field}>=javascript:gs.{}", expr.replace(' ', "%20"))
            }
        }
    }
}

/// `sysparm_display_value` mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayValue {
    /// Display values only
    #[default]
    True,
    /// Raw values only
    False,
    /// `{value, display_value, link}` for every field
    All,
}

impl DisplayValue {
    /// Wire spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Self::True => "true",
            Self::False => "false",
            Self::All => "all",
        }
    }
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "all" => Ok(Self::All),
            other => Err(Error::invalid_option(
                "display_value",
                format!("expected true, false or all, got '{other}'"),
            )),
        }
    }
}
