//! Outbound client tests against a local mock HTTP server.

#![allow(clippy::unwrap_used, clippy::panic)]

use dxtrack::feed::{FeedError, HttpFeed, StaticFeed, SubmissionSource};
use dxtrack::narrative::{NarrativeError, NarrativeGenerator, OpenAiClient};
use dxtrack_core::roadmap::RoadmapPrompt;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn feed_body() -> serde_json::Value {
    json!({
        "results": [
            {"id": "sub_1", "creationTime": "2025-01-05", "result": {"q": "a"}},
            {"id": "sub_2", "creationTime": "2025-01-06", "result": {}}
        ]
    })
}

fn prompt() -> RoadmapPrompt {
    RoadmapPrompt {
        system: "You are an advisor.".into(),
        user: "Write a roadmap.".into(),
    }
}

// =============================================================================
// FEED
// =============================================================================

#[tokio::test]
async fn test_feed_sends_query_and_writes_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/app/data/results"))
        .and(query_param("apikey", "k-123"))
        .and(query_param("SchemaId", "schema-9"))
        .and(query_param("Locale", "default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let snapshot = temp.path().join("feed.json");
    let feed = HttpFeed::new(
        format!("{}/api/app/data/results", server.uri()),
        "k-123",
        "schema-9",
    )
    .unwrap()
    .with_snapshot(&snapshot);

    let records = feed.fetch().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id.as_str(), "sub_1");
    assert_eq!(records[0].result.get("q").map(String::as_str), Some("a"));
    assert!(snapshot.exists());
}

#[tokio::test]
async fn test_feed_falls_back_to_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(feed_body()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let feed = HttpFeed::new(server.uri(), "k", "s")
        .unwrap()
        .with_snapshot(temp.path().join("feed.json"));

    let first = feed.fetch().await.unwrap();
    let second = feed.fetch().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_feed_without_snapshot_reports_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let feed = HttpFeed::new(server.uri(), "k", "s").unwrap();
    assert!(matches!(feed.fetch().await, Err(FeedError::Unavailable)));
}

#[tokio::test]
async fn test_static_feed_reads_snapshot_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("feed.json");
    assert!(StaticFeed::from_snapshot(&path).unwrap().fetch().await.unwrap().is_empty());

    std::fs::write(&path, feed_body().to_string()).unwrap();
    let records = StaticFeed::from_snapshot(&path).unwrap().fetch().await.unwrap();
    assert_eq!(records.len(), 2);

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(StaticFeed::from_snapshot(&path), Err(FeedError::Json(_))));
}

// =============================================================================
// NARRATIVE
// =============================================================================

#[tokio::test]
async fn test_completion_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 2000,
            "messages": [
                {"role": "system", "content": "You are an advisor."},
                {"role": "user", "content": "Write a roadmap."}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "## Quick wins"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiClient::new(format!("{}/v1/", server.uri()), "sk-test", "gpt-4o").unwrap();
    assert_eq!(client.generate(&prompt()).await.unwrap(), "## Quick wins");
}

#[tokio::test]
async fn test_completion_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(server.uri(), "sk", "gpt-4o").unwrap();
    match client.generate(&prompt()).await {
        Err(NarrativeError::Server { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_completion_without_text_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let client = OpenAiClient::new(server.uri(), "sk", "gpt-4o").unwrap();
    assert!(matches!(
        client.generate(&prompt()).await,
        Err(NarrativeError::Empty)
    ));
}
