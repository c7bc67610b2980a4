//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use expiring_cache::{api::create_router, AppState, CachePolicy};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(max_entries: usize) -> Router {
    let policy = CachePolicy::new(max_entries, Duration::from_secs(300)).unwrap();
    create_router(AppState::in_memory(policy))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// == GET /api/cache/:key ==

#[tokio::test]
async fn test_get_miss_then_hit() {
    let app = create_test_app(10);

    let (status, first) = send(&app, "GET", "/api/cache/greeting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["key"], "greeting");
    assert_eq!(first["hit"], false);
    let generated = first["value"].as_str().unwrap().to_string();
    assert!(!generated.is_empty());

    let (status, second) = send(&app, "GET", "/api/cache/greeting", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["hit"], true);
    assert_eq!(second["value"], generated.as_str());
}

#[tokio::test]
async fn test_get_evicts_when_full() {
    let app = create_test_app(2);

    send(&app, "GET", "/api/cache/first", None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    send(&app, "GET", "/api/cache/second", None).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    send(&app, "GET", "/api/cache/third", None).await;

    let (_, list) = send(&app, "GET", "/api/cache", None).await;
    let keys: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| pair["key"].as_str().unwrap())
        .collect();

    assert_eq!(keys.len(), 2);
    assert!(!keys.contains(&"first"));
    assert!(keys.contains(&"second"));
    assert!(keys.contains(&"third"));

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["evictions"], 1);
}

// == GET /api/cache ==

#[tokio::test]
async fn test_list_empty() {
    let app = create_test_app(10);

    let (status, json) = send(&app, "GET", "/api/cache", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_returns_all_keys() {
    let app = create_test_app(10);

    send(&app, "POST", "/api/cache", Some(r#"{"key":"test1","value":"value1"}"#)).await;
    send(&app, "POST", "/api/cache", Some(r#"{"key":"test2","value":"value2"}"#)).await;

    let (_, json) = send(&app, "GET", "/api/cache", None).await;
    let pairs = json.as_array().unwrap();

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0]["key"], "test1");
    assert_eq!(pairs[0]["value"], "value1");
    assert_eq!(pairs[1]["key"], "test2");
}

// == POST /api/cache ==

#[tokio::test]
async fn test_upsert_creates_record() {
    let app = create_test_app(10);

    let (status, json) = send(
        &app,
        "POST",
        "/api/cache",
        Some(r#"{"key":"test","value":"idontexist"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "idontexist");

    let (_, json) = send(&app, "GET", "/api/cache/test", None).await;
    assert_eq!(json["hit"], true);
    assert_eq!(json["value"], "idontexist");
}

#[tokio::test]
async fn test_upsert_updates_existing_record() {
    let app = create_test_app(10);

    let (_, generated) = send(&app, "GET", "/api/cache/test", None).await;
    assert_eq!(generated["hit"], false);

    let (status, json) = send(
        &app,
        "POST",
        "/api/cache",
        Some(r#"{"key":"test","value":"updatedvalue"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "updatedvalue");

    let (_, json) = send(&app, "GET", "/api/cache/test", None).await;
    assert_eq!(json["value"], "updatedvalue");
}

#[tokio::test]
async fn test_upsert_does_not_evict() {
    let app = create_test_app(1);

    send(&app, "GET", "/api/cache/cached", None).await;
    send(&app, "POST", "/api/cache", Some(r#"{"key":"extra","value":"v"}"#)).await;

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 2);
    assert_eq!(stats["evictions"], 0);
}

#[tokio::test]
async fn test_upsert_empty_key_rejected() {
    let app = create_test_app(10);

    let (status, json) = send(&app, "POST", "/api/cache", Some(r#"{"key":"","value":"v"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_upsert_malformed_json() {
    let app = create_test_app(10);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/cache")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key":"missing_value"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == DELETE /api/cache/:key ==

#[tokio::test]
async fn test_delete_is_idempotent() {
    let app = create_test_app(10);

    let (_, json) = send(&app, "DELETE", "/api/cache/missing", None).await;
    assert_eq!(json["deleted"], false);

    send(&app, "GET", "/api/cache/present", None).await;

    let (status, json) = send(&app, "DELETE", "/api/cache/present", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "present");
    assert_eq!(json["deleted"], true);

    let (_, json) = send(&app, "DELETE", "/api/cache/present", None).await;
    assert_eq!(json["deleted"], false);
}

// == DELETE /api/cache ==

#[tokio::test]
async fn test_clear_all() {
    let app = create_test_app(10);

    send(&app, "GET", "/api/cache/a", None).await;
    send(&app, "GET", "/api/cache/b", None).await;

    let (_, json) = send(&app, "DELETE", "/api/cache", None).await;
    assert_eq!(json["deleted"], true);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 0);

    let (_, json) = send(&app, "DELETE", "/api/cache", None).await;
    assert_eq!(json["deleted"], false);
}

// == GET /stats and /health ==

#[tokio::test]
async fn test_stats_counts_hits_and_misses() {
    let app = create_test_app(10);

    send(&app, "GET", "/api/cache/key", None).await;
    send(&app, "GET", "/api/cache/key", None).await;

    let (status, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["hit_rate"], 0.5);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(10);

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}
