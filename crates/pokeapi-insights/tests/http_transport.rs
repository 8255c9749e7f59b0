//! HTTP transport tests against a local mock server.

use std::time::Duration;

use futures::TryStreamExt;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pokeapi_insights::{ClientConfig, FetchFailure, HttpTransport, PokeClient, Transport};

// ─────────────────────── helpers ───────────────────────

fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(format!("{}/api/v2", server.uri()))
        .with_base_delay(Duration::from_millis(5))
        .with_timeout(Duration::from_secs(5))
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

// ═══════════════════════════════════════════════════════
// RETRIES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_first_attempt_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/ditto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "ditto", "weight": 40 })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).unwrap();
    let doc = transport
        .fetch(&format!("{}/api/v2/pokemon/ditto", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc["weight"], 40);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_recovers_after_two_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/mew"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon/mew"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "mew" })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).unwrap();
    let doc = transport
        .fetch(&format!("{}/api/v2/pokemon/mew", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc["name"], "mew");
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("try later"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).unwrap();
    let url = format!("{}/api/v2/pokemon/mewtwo", server.uri());
    let err = transport.fetch(&url).await.unwrap_err();

    assert_eq!(err.url, url);
    assert_eq!(err.attempts, 3);
    match err.source {
        FetchFailure::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "try later");
        }
        other => panic!("expected status failure, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_invalid_json_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server)).unwrap();
    let doc = transport
        .fetch(&format!("{}/api/v2/anything", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc["ok"], true);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_single_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&config(&server).with_max_attempts(1)).unwrap();
    let err = transport
        .fetch(&format!("{}/api/v2/pokemon/missingno", server.uri()))
        .await
        .unwrap_err();

    assert_eq!(err.attempts, 1);
    assert_eq!(request_count(&server).await, 1);
}

// ═══════════════════════════════════════════════════════
// CLIENT OVER HTTP
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_client_caches_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pokemon-species/snorlax"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "snorlax" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = PokeClient::new(&config(&server)).unwrap();
    client.species("snorlax").await.unwrap();
    client.species("snorlax").await.unwrap();

    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_client_pages_through_listing() {
    let server = MockServer::start().await;
    let second_page = format!("{}/api/v2/berry-page-2", server.uri());
    Mock::given(method("GET"))
        .and(path("/api/v2/berry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": second_page,
            "results": [{ "name": "cheri" }, { "name": "chesto" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/berry-page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next": null,
            "results": [{ "name": "pecha" }]
        })))
        .mount(&server)
        .await;

    let client = PokeClient::new(&config(&server)).unwrap();
    let entries: Vec<Value> = client.list_all("berry").try_collect().await.unwrap();
    let names: Vec<&str> = entries.iter().filter_map(|e| e["name"].as_str()).collect();

    assert_eq!(names, vec!["cheri", "chesto", "pecha"]);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_client_rejects_invalid_config() {
    let result = PokeClient::new(&ClientConfig::default().with_max_attempts(0));
    assert!(result.is_err());
}
