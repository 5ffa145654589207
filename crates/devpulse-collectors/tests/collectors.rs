//! Integration tests for the platform collectors using wiremock HTTP mocks.

use chrono::{TimeZone, Utc};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devpulse_collectors::{ArticlesCollector, ForumCollector, SocialCollector, TechNewsCollector};
use devpulse_core::{
    ArticlesConfig, ForumConfig, Platform, RecencyWindow, SocialConfig, TechNewsConfig,
};
use devpulse_fetch::FetchClient;

fn test_client() -> FetchClient {
    FetchClient::new(5, "devpulse-test/0.1", 0, 0).expect("client construction should not fail")
}

/// Window covering all of January 2024, which the fixture timestamps fall in.
fn january_window() -> RecencyWindow {
    RecencyWindow::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
    )
}

fn forum_topic(id: u64, title: &str, created_at: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "excerpt": "an excerpt",
        "created_at": created_at,
        "last_poster_username": "alice",
        "reply_count": 2,
        "views": 10,
        "tags": ["bug"]
    })
}

#[tokio::test]
async fn forum_collector_merges_tags_and_treats_404_as_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tag/bug/l/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "topic_list": { "topics": [
                forum_topic(1, "Crash on save", "2024-01-05T10:00:00Z"),
                forum_topic(2, "Too old", "2023-06-01T10:00:00Z"),
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tag/unknown/l/latest.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let collector = ForumCollector::new(
        test_client(),
        ForumConfig {
            base_url: server.uri(),
            pace_ms: 0,
            tags: vec!["bug".to_string(), "unknown".to_string()],
        },
    );

    let output = collector.collect(january_window()).await;
    assert!(output.is_clean(), "404 must not be an error: {:?}", output.errors);
    assert_eq!(output.items.len(), 1, "out-of-window topic must be dropped");
    assert_eq!(output.items[0].platform, Platform::Forum);
    assert!(output.items[0].content.starts_with("Crash on save"));
}

#[tokio::test]
async fn forum_collector_records_marker_and_continues_on_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tag/broken/l/latest.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tag/bug/l/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "topic_list": { "topics": [forum_topic(1, "Crash on save", "2024-01-05T10:00:00Z")]}
        })))
        .mount(&server)
        .await;

    let collector = ForumCollector::new(
        test_client(),
        ForumConfig {
            base_url: server.uri(),
            pace_ms: 0,
            tags: vec!["broken".to_string(), "bug".to_string()],
        },
    );

    let output = collector.collect(january_window()).await;
    assert_eq!(output.items.len(), 1, "later tags must still be collected");
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].contains("broken"));
}

#[tokio::test]
async fn social_collector_maps_community_feed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/r/devtools/new.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "children": [
                { "data": {
                    "title": "Builds are slow",
                    "selftext": "Incremental builds take minutes.",
                    "author": "bob",
                    "score": 57,
                    "num_comments": 12,
                    "created_utc": 1_704_450_000.0,
                    "permalink": "/r/devtools/comments/abc/slow_builds/"
                }},
                { "data": {
                    "title": "Ancient post",
                    "author": "eve",
                    "created_utc": 1_600_000_000.0,
                    "permalink": "/r/devtools/comments/old/"
                }}
            ]}
        })))
        .mount(&server)
        .await;

    let collector = SocialCollector::new(
        test_client(),
        SocialConfig {
            base_url: server.uri(),
            pace_ms: 0,
            communities: vec!["devtools".to_string()],
            per_page: 50,
        },
    );

    let output = collector.collect(january_window()).await;
    assert!(output.is_clean());
    assert_eq!(output.items.len(), 1);
    assert_eq!(output.items[0].author, "bob");
    assert_eq!(output.items[0].metadata["num_comments"], 12);
}

#[tokio::test]
async fn technews_collector_scans_ids_and_skips_dead_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/newstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([101, 102, 103])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/101.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 101,
            "title": "Show: my new build tool",
            "text": "I built a thing.",
            "by": "pg",
            "time": 1_704_450_000,
            "score": 321,
            "kids": [1, 2]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/102.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 102,
            "title": "Dead story",
            "time": 1_704_450_000,
            "dead": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/item/103.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let collector = TechNewsCollector::new(
        test_client(),
        TechNewsConfig {
            base_url: server.uri(),
            pace_ms: 0,
            scan_limit: 10,
        },
    );

    let output = collector.collect(january_window()).await;
    assert!(output.is_clean(), "missing item id must not be an error");
    assert_eq!(output.items.len(), 1);
    assert_eq!(output.items[0].author, "pg");
    assert_eq!(output.items[0].metadata["comment_count"], 2);
}

#[tokio::test]
async fn technews_collector_honors_scan_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v0/newstories.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([201, 202, 203, 204])),
        )
        .mount(&server)
        .await;
    // Only the first id inside the scan limit is ever requested.
    Mock::given(method("GET"))
        .and(path("/v0/item/201.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 201,
            "title": "Only scanned story",
            "by": "pg",
            "time": 1_704_450_000
        })))
        .expect(1)
        .mount(&server)
        .await;

    let collector = TechNewsCollector::new(
        test_client(),
        TechNewsConfig {
            base_url: server.uri(),
            pace_ms: 0,
            scan_limit: 1,
        },
    );

    let output = collector.collect(january_window()).await;
    assert_eq!(output.items.len(), 1);
}

#[tokio::test]
async fn technews_listing_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0/newstories.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let collector = TechNewsCollector::new(
        test_client(),
        TechNewsConfig {
            base_url: server.uri(),
            pace_ms: 0,
            scan_limit: 10,
        },
    );

    let output = collector.collect(january_window()).await;
    assert!(output.items.is_empty());
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].contains("newstories"));
}

#[tokio::test]
async fn articles_collector_filters_by_tag_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/articles"))
        .and(query_param("tag", "devtools"))
        .and(query_param("per_page", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "id": 77,
                "title": "Why our builds got 3x faster",
                "description": "A deep dive.",
                "url": "https://articles.example.com/a/77",
                "published_at": "2024-01-05T09:30:00Z",
                "user": { "username": "carol" },
                "public_reactions_count": 44,
                "comments_count": 6,
                "tag_list": ["devtools"]
            }
        ])))
        .mount(&server)
        .await;

    let collector = ArticlesCollector::new(
        test_client(),
        ArticlesConfig {
            base_url: server.uri(),
            pace_ms: 0,
            tags: vec!["devtools".to_string()],
            per_page: 30,
        },
    );

    let output = collector.collect(january_window()).await;
    assert!(output.is_clean());
    assert_eq!(output.items.len(), 1);
    assert_eq!(output.items[0].platform, Platform::Articles);
    assert_eq!(output.items[0].author, "carol");
}
