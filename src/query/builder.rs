//! Table query rendering

use super::types::{DisplayValue, FilterClause, RelativeDate};
use crate::error::{Error, Result};

/// Path of the table API under an instance base URL
const TABLE_API_PATH: &str = "api/now/table";

/// Render `field=v1^ORfield=v2…` with each value percent-encoded.
///
/// Returns an empty string when `values` is empty or holds only blanks.
pub fn build_filter_clause<S: AsRef<str>>(field: &str, values: &[S]) -> String {
    FilterClause::new(field, values.iter().map(|v| v.as_ref().to_string())).render()
}

/// Group `key=value` pairs separated by commas into clauses.
///
/// Repeated keys become one OR clause; keys keep their first-seen order.
pub fn parse_filter_pairs(input: &str) -> Result<Vec<FilterClause>> {
    let mut clauses: Vec<FilterClause> = Vec::new();

    for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::invalid_option("filters", format!("expected key=value, got '{pair}'"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_option(
                "filters",
                format!("missing key in '{pair}'"),
            ));
        }

        match clauses.iter_mut().find(|c| c.field == key) {
            Some(clause) => clause.values.push(value.trim().to_string()),
            None => clauses.push(FilterClause::new(key, [value.trim()])),
        }
    }

    Ok(clauses)
}

/// A table-scoped query.
///
/// Rendered AND order: relative-date clause, filter and raw clauses in
/// insertion order, then the active flag. Empty clauses are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    clauses: Vec<String>,
    relative: Option<RelativeDate>,
    active: Option<bool>,
    limit: Option<u32>,
    fields: Vec<String>,
    display_value: DisplayValue,
}

impl TableQuery {
    /// Query every row of `table`
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// AND a filter clause
    #[must_use]
    pub fn filter(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause.render());
        self
    }

    /// AND several filter clauses
    #[must_use]
    pub fn filters(mut self, clauses: impl IntoIterator<Item = FilterClause>) -> Self {
        self.clauses.extend(clauses.into_iter().map(|c| c.render()));
        self
    }

    /// AND an already rendered clause, e.g. a stored report filter
    #[must_use]
    pub fn clause(mut self, clause: impl Into<String>) -> Self {
        self.clauses.push(clause.into().trim().replace(' ', "%20"));
        self
    }

    /// AND several already rendered clauses
    #[must_use]
    pub fn clauses<I, S>(self, clauses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        clauses.into_iter().fold(self, |query, c| query.clause(c))
    }

    /// Restrict to rows whose `field` is recent enough
    #[must_use]
    pub fn relative_date(mut self, relative: RelativeDate) -> Self {
        self.relative = Some(relative);
        self
    }

    /// Restrict to rows whose `field` is at most `days` old
    #[must_use]
    pub fn days_ago(self, field: impl Into<String>, days: u32) -> Self {
        self.relative_date(RelativeDate::days_ago(field, days))
    }

    /// Filter on the `active` column
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    /// Cap the page size the API returns
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only return these columns
    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field: String = field.into();
            let field = field.trim();
            if !field.is_empty() {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    /// Choose how reference fields are returned
    #[must_use]
    pub fn display_value(mut self, mode: DisplayValue) -> Self {
        self.display_value = mode;
        self
    }

    /// The encoded `sysparm_query` value
    pub fn filter_string(&self) -> String {
        let relative = self.relative.as_ref().map(RelativeDate::render);
        let active = self.active.map(|a| format!("active={a}"));

        relative
            .into_iter()
            .chain(self.clauses.iter().cloned())
            .chain(active)
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("^")
    }

    /// Full request URL under an instance base URL
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!(
            "{}/{TABLE_API_PATH}/{}?sysparm_query={}&sysparm_display_value={}",
            base_url.trim_end_matches('/'),
            self.table,
            self.filter_string(),
            self.display_value,
        );
        if let Some(limit) = self.limit {
            url.push_str(&format!("&sysparm_limit={limit}"));
        }
        if !self.fields.is_empty() {
            url.push_str(&format!("&sysparm_fields={}", self.fields.join(",")));
        }
        url
    }
}
