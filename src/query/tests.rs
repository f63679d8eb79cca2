//! Tests for the query module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use test_case::test_case;

// ============================================================================
// Filter Clause Tests
// ============================================================================

#[test_case(&[], "" ; "no values")]
#[test_case(&["", "  "], "" ; "only blanks")]
#[test_case(&["jdoe"], "user_name=jdoe" ; "single value")]
#[test_case(&["a b", "c"], "user_name=a%20b^ORuser_name=c" ; "encoded and joined")]
#[test_case(&["c", "", "a"], "user_name=c^ORuser_name=a" ; "order kept blanks skipped")]
fn test_build_filter_clause(values: &[&str], expected: &str) {
    assert_eq!(build_filter_clause("user_name", values), expected);
}

#[test]
fn test_filter_clause_encodes_reserved_characters() {
    let clause = FilterClause::new("short_description", ["disk 100% full", "a&b"]);
    assert_eq!(
        clause.render(),
        "short_description=disk%20100%25%20full^ORshort_description=a%26b"
    );
}

#[test]
fn test_filter_clause_is_empty() {
    assert!(FilterClause::new("x", Vec::<String>::new()).is_empty());
    assert!(FilterClause::new("x", [" "]).is_empty());
    assert!(!FilterClause::new("x", ["1"]).is_empty());
}

// ============================================================================
// Relative Date Tests
// ============================================================================

#[test]
fn test_relative_date_days_ago() {
    let clause = RelativeDate::days_ago("sys_created_on", 30);
    assert_eq!(clause.render(), "sys_created_on>=javascript:gs.daysAgo(30)");
}

#[test]
fn test_relative_date_glide() {
    let clause = RelativeDate::glide("opened_at", "beginningOfLastWeek()");
    assert_eq!(
        clause.render(),
        "opened_at>=javascript:gs.beginningOfLastWeek()"
    );

    // a leading gs. is not doubled
    let clause = RelativeDate::glide("opened_at", "gs.hoursAgo(4)");
    assert_eq!(clause.render(), "opened_at>=javascript:gs.hoursAgo(4)");
}

// ============================================================================
// Table Query Tests
// ============================================================================

#[test]
fn test_empty_clauses_are_dropped() {
    let query = TableQuery::new("incident").clauses(["a=1", "", "b=2"]);
    let filter = query.filter_string();

    assert_eq!(filter, "a=1^b=2");
    assert!(!filter.contains("^^"));
    assert!(!filter.starts_with('^'));
    assert!(!filter.ends_with('^'));
}

#[test]
fn test_only_empty_clauses() {
    let query = TableQuery::new("incident")
        .clauses(["", ""])
        .filter(FilterClause::new("assigned_to", Vec::<String>::new()));
    assert_eq!(query.filter_string(), "");
}

#[test]
fn test_clause_ordering() {
    let query = TableQuery::new("incident")
        .active(true)
        .filter(FilterClause::new("priority", ["1", "2"]))
        .days_ago("sys_created_on", 7)
        .clause("state=2");

    assert_eq!(
        query.filter_string(),
        "sys_created_on>=javascript:gs.daysAgo(7)^priority=1^ORpriority=2^state=2^active=true"
    );
}

#[test]
fn test_active_false() {
    let query = TableQuery::new("sc_task").active(false);
    assert_eq!(query.filter_string(), "active=false");
}

#[test]
fn test_url_without_clauses_requests_all_rows() {
    let url = TableQuery::new("cmdb_ci_outage").url("https://acme.service-now.com/");
    assert_eq!(
        url,
        "https://acme.service-now.com/api/now/table/cmdb_ci_outage?sysparm_query=&sysparm_display_value=true"
    );
}

#[test]
fn test_url_with_limit_and_fields() {
    let url = TableQuery::new("incident")
        .filter(FilterClause::new("assigned_to", ["abc"]))
        .limit(500)
        .fields(["number", " ", "short_description "])
        .display_value(DisplayValue::All)
        .url("https://acme.service-now.com");

    assert_eq!(
        url,
        "https://acme.service-now.com/api/now/table/incident?sysparm_query=assigned_to=abc\
         &sysparm_display_value=all&sysparm_limit=500&sysparm_fields=number,short_description"
    );
}

#[test]
fn test_raw_clause_spaces_are_encoded() {
    let query = TableQuery::new("incident").clause("category=Service Desk^active=true");
    assert_eq!(query.filter_string(), "category=Service%20Desk^active=true");
}

#[test]
fn test_display_value_strings() {
    assert_eq!(DisplayValue::default().as_str(), "true");
    assert_eq!(DisplayValue::False.to_string(), "false");
    assert_eq!(DisplayValue::All.to_string(), "all");

    assert_eq!("ALL".parse::<DisplayValue>().unwrap(), DisplayValue::All);
    assert_eq!(" false ".parse::<DisplayValue>().unwrap(), DisplayValue::False);
    assert!("maybe".parse::<DisplayValue>().unwrap_err().is_config());
}

// ============================================================================
// Filter Pair Parsing Tests
// ============================================================================

#[test]
fn test_parse_filter_pairs_groups_keys() {
    let clauses = parse_filter_pairs("contact_type=phone, priority=1,contact_type=email").unwrap();

    assert_eq!(
        clauses,
        vec![
            FilterClause::new("contact_type", ["phone", "email"]),
            FilterClause::new("priority", ["1"]),
        ]
    );

    let query = TableQuery::new("incident").filters(clauses);
    assert_eq!(
        query.filter_string(),
        "contact_type=phone^ORcontact_type=email^priority=1"
    );
}

#[test]
fn test_parse_filter_pairs_empty_input() {
    assert!(parse_filter_pairs("").unwrap().is_empty());
    assert!(parse_filter_pairs(" , ").unwrap().is_empty());
}

#[test_case("active" ; "no equals sign")]
#[test_case("=true" ; "no key")]
fn test_parse_filter_pairs_rejects(input: &str) {
    let err = parse_filter_pairs(input).unwrap_err();
    assert!(matches!(err, Error::InvalidOption { ref field, .. } if field == "filters"));
}
