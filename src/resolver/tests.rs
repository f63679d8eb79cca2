//! Tests for the resolver module

use super::*;
use crate::auth::AuthConfig;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::record::{Field, RecordEnvelope};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: &str = "6816f79cc0a8016401c5a33be04be441";

fn client() -> HttpClient {
    HttpClient::with_auth(HttpClientConfig::default(), AuthConfig::basic("svc", "pw")).unwrap()
}

fn user_link(server: &MockServer, id: &str) -> String {
    format!("{}/api/now/table/sys_user/{}", server.uri(), id)
}

fn incident(server: &MockServer, id: &str) -> RecordEnvelope {
    serde_json::from_value(json!({
        "number": "INC0010001",
        "assigned_to": {"value": id, "link": user_link(server, id)}
    }))
    .unwrap()
}

async fn mount_user(server: &MockServer, id: &str, body: Value, expect: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/now/table/sys_user/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expect)
        .mount(server)
        .await;
}

// ============================================================================
// ReplacementMap Tests
// ============================================================================

#[test]
fn test_replacement_map_parse() {
    let map = ReplacementMap::parse("assigned_to=user_name, assignment_group=name,,bogus, =x");

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("assigned_to"), Some("user_name"));
    assert_eq!(map.get("assignment_group"), Some("name"));
    assert_eq!(map.get("bogus"), None);
    assert_eq!(
        map.iter().collect::<Vec<_>>(),
        vec![("assigned_to", "user_name"), ("assignment_group", "name")]
    );
}

#[test]
fn test_replacement_map_empty() {
    assert!(ReplacementMap::parse("").is_empty());
    assert!(ReplacementMap::default().is_empty());
}

// ============================================================================
// Cache Tests
// ============================================================================

#[test]
fn test_reference_cache() {
    let mut cache = ReferenceCache::new();
    assert!(cache.is_empty());

    cache.insert("abc", "fred");
    cache.insert("abc", "fred.luddy");

    assert_eq!(cache.len(), 1);
    assert!(cache.contains("abc"));
    assert_eq!(cache.get("abc"), Some("fred.luddy"));
    assert_eq!(cache.get("def"), None);
}

// ============================================================================
// Resolution Tests
// ============================================================================

#[tokio::test]
async fn test_repeated_ids_fetch_once() {
    let server = MockServer::start().await;
    mount_user(&server, USER_ID, json!({"result": {"user_name": "fred.luddy"}}), 1).await;

    let mut resolver = ReferenceResolver::new(client());

    let mut first = incident(&server, USER_ID);
    let outcome = resolver.resolve(&mut first, "assigned_to", "user_name").await;
    assert_eq!(outcome, Resolution::Fetched);
    assert_eq!(first.get("assigned_to"), Some(&Field::from("fred.luddy")));

    let mut second = incident(&server, USER_ID);
    let outcome = resolver.resolve(&mut second, "assigned_to", "user_name").await;
    assert_eq!(outcome, Resolution::Cached);
    assert_eq!(second.get("assigned_to"), Some(&Field::from("fred.luddy")));

    assert_eq!(resolver.cache().len(), 1);
}

#[tokio::test]
async fn test_system_sentinel_skips_network_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut resolver = ReferenceResolver::new(client());
    let mut record = incident(&server, "system");

    let outcome = resolver.resolve(&mut record, "assigned_to", "user_name").await;

    assert_eq!(outcome, Resolution::System);
    assert!(outcome.is_resolved());
    assert_eq!(record.get("assigned_to"), Some(&Field::from("system")));
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
async fn test_not_found_leaves_field_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No Record found"}
        })))
        .mount(&server)
        .await;

    let mut resolver = ReferenceResolver::new(client());
    let mut record = incident(&server, USER_ID);
    let before = record.clone();

    let outcome = resolver.resolve(&mut record, "assigned_to", "user_name").await;

    assert_eq!(outcome, Resolution::Unresolved);
    assert_eq!(record, before);
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
async fn test_missing_remote_field_leaves_field_untouched() {
    let server = MockServer::start().await;
    mount_user(&server, USER_ID, json!({"result": {"name": "Fred Luddy"}}), 1).await;

    let mut resolver = ReferenceResolver::new(client());
    let mut record = incident(&server, USER_ID);

    let outcome = resolver.resolve(&mut record, "assigned_to", "user_name").await;

    assert_eq!(outcome, Resolution::Unresolved);
    assert!(record.get("assigned_to").unwrap().is_reference());
}

#[tokio::test]
async fn test_non_reference_fields_are_ignored() {
    let mut resolver = ReferenceResolver::new(client());
    let mut record: RecordEnvelope = serde_json::from_value(json!({
        "assigned_to": "",
        "state": {"value": "2", "display_value": "In Progress"}
    }))
    .unwrap();

    assert_eq!(
        resolver.resolve(&mut record, "assigned_to", "user_name").await,
        Resolution::Unresolved
    );
    assert_eq!(
        resolver.resolve(&mut record, "missing", "user_name").await,
        Resolution::Unresolved
    );
    // a reference without a link has nowhere to go
    assert_eq!(
        resolver.resolve(&mut record, "state", "name").await,
        Resolution::Unresolved
    );
}

#[tokio::test]
async fn test_resolve_all_applies_each_pair() {
    let server = MockServer::start().await;
    mount_user(&server, USER_ID, json!({"result": {"user_name": "fred.luddy"}}), 1).await;
    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user_group/g1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"name": "Service Desk"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut record = incident(&server, USER_ID);
    record.insert(
        "assignment_group",
        Field::from(json!({
            "value": "g1",
            "link": format!("{}/api/now/table/sys_user_group/g1", server.uri())
        })),
    );

    let mut resolver = ReferenceResolver::new(client());
    let replacements = ReplacementMap::parse("assigned_to=user_name, assignment_group=name");
    resolver.resolve_all(&mut record, &replacements).await;

    assert_eq!(record.text("assigned_to"), Some("fred.luddy".to_string()));
    assert_eq!(record.text("assignment_group"), Some("Service Desk".to_string()));
    assert_eq!(record.text("number"), Some("INC0010001".to_string()));
}

// ============================================================================
// Sys Id Lookup Tests
// ============================================================================

#[tokio::test]
async fn test_lookup_sys_ids_primes_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/now/table/sys_user"))
        .and(query_param("sysparm_query", "user_name=fred.luddy^ORuser_name=beth.anglin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [
                {"sys_id": USER_ID, "user_name": "fred.luddy"},
                {"sys_id": "46d44a23a9fe19810012d100cca80666", "user_name": "beth.anglin"},
                {"sys_id": "", "user_name": "ghost"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut resolver = ReferenceResolver::new(client());
    let lookup = resolver
        .lookup_sys_ids(
            &server.uri(),
            "sys_user",
            "user_name",
            &["fred.luddy", "beth.anglin"],
            Some("user_name"),
        )
        .await
        .unwrap();

    assert_eq!(
        lookup.sys_ids,
        vec![USER_ID, "46d44a23a9fe19810012d100cca80666"]
    );
    assert_eq!(lookup.records.len(), 2);
    assert_eq!(resolver.cache().get(USER_ID), Some("fred.luddy"));

    // a later reference to a looked-up row needs no request
    let mut record = incident(&server, USER_ID);
    assert_eq!(
        resolver.resolve(&mut record, "assigned_to", "user_name").await,
        Resolution::Cached
    );
}

#[tokio::test]
async fn test_lookup_sys_ids_without_values_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut resolver = ReferenceResolver::new(client());
    let empty: [&str; 0] = [];
    let lookup = resolver
        .lookup_sys_ids(&server.uri(), "sys_user", "user_name", &empty, None)
        .await
        .unwrap();

    assert!(lookup.sys_ids.is_empty());
    assert!(lookup.records.is_empty());
}

#[tokio::test]
async fn test_lookup_sys_ids_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("User Not Authenticated"))
        .mount(&server)
        .await;

    let mut resolver = ReferenceResolver::new(client());
    let err = resolver
        .lookup_sys_ids(&server.uri(), "sys_user", "user_name", &["fred"], None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}
