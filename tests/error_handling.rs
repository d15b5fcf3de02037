//! Error rendering, diagnostic routes and middleware behaviour.

use std::time::Duration;

use reactivities::config::Environment;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

mod common;

async fn get(server: &common::TestServer, path: &str) -> reqwest::Response {
    server
        .http()
        .get(format!("{}{}", server.url(), path))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_buggy_client_errors() {
    let server = common::spawn_default().await;

    let response = get(&server, "/api/buggy/not-found").await;
    assert_eq!(response.status(), 404);
    assert!(response.text().await.unwrap().is_empty());

    let response = get(&server, "/api/buggy/bad-request").await;
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.unwrap(), "This is a bad request");

    let response = get(&server, "/api/buggy/unauthorised").await;
    assert_eq!(response.status(), 401);

    let response = get(&server, "/api/buggy/validation-error").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "ValidationFailure");
    assert_eq!(body["status"], 400);
    assert_eq!(body["errors"]["problem1"][0], "This is the first error");
    assert_eq!(body["errors"]["problem2"][0], "This is the second error");
}

#[tokio::test]
async fn test_server_error_includes_details_in_development() {
    let server = common::spawn_default().await;

    let response = get(&server, "/api/buggy/server-error").await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "This is a server error");
    assert!(body["details"].as_str().unwrap().contains("Internal"));
}

#[tokio::test]
async fn test_diagnostics_hidden_in_production() {
    let mut config = common::test_config();
    config.environment = Environment::Production;
    let server = common::spawn_server(config).await;

    assert_eq!(get(&server, "/api/buggy/server-error").await.status(), 404);
    assert_eq!(get(&server, "/api/buggy/not-found").await.status(), 404);
}

#[tokio::test]
async fn test_health_and_response_headers() {
    let server = common::spawn_default().await;

    let response = get(&server, "/health").await;
    assert_eq!(response.status(), 200);
    let headers = response.headers().clone();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let health = server.client().health().await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let server = common::spawn_default().await;

    let response = server
        .http()
        .get(format!("{}/health", server.url()))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = common::spawn_default().await;

    let response = server
        .http()
        .post(format!("{}/api/account/register", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(!response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cors_allows_configured_origin_with_credentials() {
    let server = common::spawn_default().await;

    let response = server
        .http()
        .request(reqwest::Method::OPTIONS, format!("{}/api/activities", server.url()))
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "http://localhost:3000");
    assert_eq!(headers["access-control-allow-credentials"], "true");

    let response = server
        .http()
        .request(reqwest::Method::OPTIONS, format!("{}/api/activities", server.url()))
        .header("origin", "http://evil.example")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();
    assert!(!response.headers().contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_shutdown_is_bounded_by_grace_period() {
    let mut config = common::test_config();
    config.timeouts.shutdown_grace_secs = 1;
    let mut server = common::spawn_server(config).await;

    // A client that never finishes its request headers.
    let mut stalled = TcpStream::connect(server.addr).await.unwrap();
    stalled.write_all(b"GET /health HTTP/1.1\r\nHost: test\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(server.stop_within(Duration::from_secs(5)).await);
}
