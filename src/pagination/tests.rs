//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLE_PATH: &str = "/api/now/table/incident";

fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
        map.insert(*k, HeaderValue::from_str(v).unwrap());
    }
    map
}

fn page_url(server: &MockServer, offset: u64) -> String {
    format!("{}{}?sysparm_limit=100&sysparm_offset={}", server.uri(), TABLE_PATH, offset)
}

fn rows(start: u64, count: u64) -> Value {
    let rows: Vec<Value> = (start..start + count)
        .map(|i| json!({"number": format!("INC{i:07}")}))
        .collect();
    json!({ "result": rows })
}

/// Mount one page at `offset`, optionally linking to `next`
async fn mount_page(
    server: &MockServer,
    offset: u64,
    body: Value,
    next: Option<u64>,
    total: Option<u64>,
) {
    let mut response = ResponseTemplate::new(200).set_body_json(body);
    if let Some(next) = next {
        response = response.insert_header(
            "Link",
            format!(
                "<{}>;rel=\"first\",<{}>;rel=\"next\"",
                page_url(server, 0),
                page_url(server, next)
            )
            .as_str(),
        );
    }
    if let Some(total) = total {
        response = response.insert_header("X-Total-Count", total.to_string().as_str());
    }

    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("sysparm_offset", offset.to_string()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn client() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::default()).unwrap()
}

async fn drain(walker: &mut PageWalker) -> Vec<SourcedRecord> {
    let mut out = Vec::new();
    while let Some(record) = walker.next_record().await.unwrap() {
        out.push(record);
    }
    out
}

// ============================================================================
// Link Header Tests
// ============================================================================

#[test]
fn test_parse_link_header() {
    let header = r#"<https://x/api?sysparm_offset=0>;rel="first",<https://x/api?sysparm_offset=100>;rel="next",<https://x/api?sysparm_offset=900>;rel="last""#;

    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://x/api?sysparm_offset=100".to_string())
    );
    assert_eq!(
        parse_link_header(header, "last"),
        Some("https://x/api?sysparm_offset=900".to_string())
    );
    assert_eq!(parse_link_header(header, "prev"), None);
}

#[test]
fn test_parse_link_header_with_commas_in_url() {
    let header = r#"<https://x/api?sysparm_fields=number,state&sysparm_offset=100>; rel="next""#;
    assert_eq!(
        parse_link_header(header, "next"),
        Some("https://x/api?sysparm_fields=number,state&sysparm_offset=100".to_string())
    );
}

#[test]
fn test_link_offset() {
    assert_eq!(link_offset("https://x/api?sysparm_limit=100&sysparm_offset=200"), Some(200));
    assert_eq!(link_offset("https://x/api?sysparm_limit=100"), None);
}

// ============================================================================
// Next Page Decision Tests
// ============================================================================

#[test]
fn test_next_page_without_link_is_done() {
    let next = next_page(&headers(&[("x-total-count", "5")]), None);
    assert_eq!(next, NextPage::Done(StopReason::NoNextLink));
    assert!(next.is_done());
}

#[test]
fn test_next_page_follows_link() {
    let h = headers(&[("link", "<https://x/api?sysparm_offset=100>;rel=\"next\"")]);
    let next = next_page(&h, None);
    assert!(next.is_continue());
    assert_eq!(
        next,
        NextPage::Continue {
            url: "https://x/api?sysparm_offset=100".to_string()
        }
    );
}

#[test]
fn test_next_page_ceiling_applies_without_limit() {
    let h = headers(&[
        ("link", "<https://x/api?sysparm_offset=100>;rel=\"next\""),
        ("x-total-count", "10001"),
    ]);
    assert_eq!(
        next_page(&h, None),
        NextPage::Done(StopReason::CeilingExceeded { total: 10_001 })
    );

    let at_ceiling = headers(&[
        ("link", "<https://x/api?sysparm_offset=100>;rel=\"next\""),
        ("x-total-count", "10000"),
    ]);
    assert!(next_page(&at_ceiling, None).is_continue());
}

#[test]
fn test_next_page_limit_compares_offset() {
    let h = headers(&[("link", "<https://x/api?sysparm_offset=200>;rel=\"next\"")]);
    assert_eq!(
        next_page(&h, Some(150)),
        NextPage::Done(StopReason::LimitReached { offset: 200 })
    );
    assert!(next_page(&h, Some(200)).is_continue());
}

#[test]
fn test_total_count_header() {
    assert_eq!(total_count(&headers(&[("x-total-count", " 42 ")])), Some(42));
    assert_eq!(total_count(&headers(&[("x-total-count", "many")])), None);
    assert_eq!(total_count(&HeaderMap::new()), None);
}

// ============================================================================
// Walker Tests
// ============================================================================

#[tokio::test]
async fn test_walker_follows_three_pages_in_order() {
    let server = MockServer::start().await;
    mount_page(&server, 0, rows(0, 100), Some(100), Some(250)).await;
    mount_page(&server, 100, rows(100, 100), Some(200), Some(250)).await;
    mount_page(&server, 200, rows(200, 50), None, Some(250)).await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), None);
    let records = drain(&mut walker).await;

    assert_eq!(records.len(), 250);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.record.text("number"), Some(format!("INC{i:07}")));
        assert_eq!(record.total_count, Some(250));
    }
    assert_eq!(records[0].source, page_url(&server, 0));
    assert_eq!(records[150].source, page_url(&server, 100));
    assert_eq!(records[249].source, page_url(&server, 200));

    assert_eq!(walker.state().pages, 3);
    assert_eq!(walker.state().records, 250);
    assert_eq!(walker.stop_reason(), Some(StopReason::NoNextLink));
    assert!(walker.last_error().is_none());
}

#[tokio::test]
async fn test_walker_limit_stops_at_page_granularity() {
    let server = MockServer::start().await;
    mount_page(&server, 0, rows(0, 100), Some(100), None).await;
    mount_page(&server, 100, rows(100, 100), Some(200), None).await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), Some(150));
    let records = drain(&mut walker).await;

    assert_eq!(records.len(), 200);
    assert_eq!(walker.state().pages, 2);
    assert_eq!(
        walker.stop_reason(),
        Some(StopReason::LimitReached { offset: 200 })
    );
}

#[tokio::test]
async fn test_walker_stops_above_ceiling() {
    let server = MockServer::start().await;
    mount_page(&server, 0, rows(0, 100), Some(100), Some(25_000)).await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), None);
    let records = drain(&mut walker).await;

    assert_eq!(records.len(), 100);
    assert_eq!(
        walker.stop_reason(),
        Some(StopReason::CeilingExceeded { total: 25_000 })
    );
}

#[tokio::test]
async fn test_walker_failure_ends_walk_quietly() {
    let server = MockServer::start().await;
    mount_page(&server, 0, rows(0, 100), Some(100), None).await;
    Mock::given(method("GET"))
        .and(path(TABLE_PATH))
        .and(query_param("sysparm_offset", "100"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), None);
    let records = drain(&mut walker).await;

    assert_eq!(records.len(), 100);
    assert_eq!(walker.stop_reason(), Some(StopReason::Failed));
    match walker.last_error() {
        Some(Error::HttpStatus { status, url, .. }) => {
            assert_eq!(*status, 500);
            assert_eq!(url, &page_url(&server, 100));
        }
        other => panic!("Expected HttpStatus, got {other:?}"),
    }

    // once done, the walker stays done
    assert!(walker.next_record().await.unwrap().is_none());
    assert!(walker.take_last_error().is_some());
    assert!(walker.last_error().is_none());
}

#[tokio::test]
async fn test_walker_first_page_failure_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("User Not Authenticated"))
        .expect(1)
        .mount(&server)
        .await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), None);
    assert!(walker.next_record().await.unwrap().is_none());
    assert!(matches!(
        walker.last_error(),
        Some(Error::HttpStatus { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_walker_malformed_json_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let mut walker = PageWalker::new(client(), page_url(&server, 0), None);
    let err = walker.next_record().await.unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_walker_result_shapes() {
    let server = MockServer::start().await;
    mount_page(&server, 0, json!({"status": "ok"}), None, None).await;
    mount_page(&server, 1, json!({"result": {"number": "INC1"}}), None, None).await;

    let mut empty = PageWalker::new(client(), page_url(&server, 0), None);
    assert!(empty.next_record().await.unwrap().is_none());
    assert!(empty.last_error().is_none());

    let mut not_array = PageWalker::new(client(), page_url(&server, 1), None);
    assert!(matches!(
        not_array.next_record().await,
        Err(Error::Decode { .. })
    ));
}

#[tokio::test]
async fn test_walker_into_stream() {
    let server = MockServer::start().await;
    mount_page(&server, 0, rows(0, 3), Some(3), None).await;
    mount_page(&server, 3, rows(3, 2), None, None).await;

    let walker = PageWalker::new(client(), page_url(&server, 0), None);
    let numbers: Vec<String> = walker
        .into_stream()
        .map(|r| r.unwrap().record.text("number").unwrap())
        .collect()
        .await;

    assert_eq!(
        numbers,
        vec!["INC0000000", "INC0000001", "INC0000002", "INC0000003", "INC0000004"]
    );
}
