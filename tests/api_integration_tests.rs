//! Integration Tests for API Endpoints
//!
//! Drives the gateway router with `oneshot` while it talks over real HTTP to
//! an in-process storefront upstream.

mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use storefront_search::search::RetryPolicy;
use storefront_search::{api::create_router, AppState, SearchClient};
use tower::ServiceExt;

use common::{spawn_upstream, unused_base_url, Upstream};

// == Helper Functions ==

async fn create_test_app() -> (Router, Upstream) {
    let (base_url, upstream) = spawn_upstream().await;
    (app_for(&base_url), upstream)
}

fn app_for(base_url: &str) -> Router {
    let client = SearchClient::builder(base_url)
        .retry_policy(RetryPolicy::new(1, Duration::from_millis(10)))
        .build()
        .unwrap();
    create_router(AppState::new(client))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Search Endpoint Tests ==

#[tokio::test]
async fn test_search_endpoint_success() {
    let (app, upstream) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/search?q=shoes&page=2&limit=12").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"][0]["_id"], "p1");
    assert_eq!(json["products"][0]["name"], "shoes result");
    assert_eq!(json["pagination"]["page"], 2);
    assert_eq!(json["filters"]["categories"][0], "shoes");
    assert_eq!(upstream.search_calls(), 1);
}

#[tokio::test]
async fn test_search_forwards_sorted_colors() {
    let (app, _) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/search?q=hat&colors=red,blue").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["products"][0]["colors"], serde_json::json!(["blue", "red"]));
}

#[tokio::test]
async fn test_equivalent_searches_share_cache_entry() {
    let (app, upstream) = create_test_app().await;

    let (first, _) = get(&app, "/api/products/search?q=shoes&page=1&limit=12&colors=red,blue").await;
    let (second, _) = get(&app, "/api/products/search?limit=12&colors=blue,red&page=1&q=shoes").await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(upstream.search_calls(), 1);

    let (_, stats) = get(&app, "/stats").await;
    assert_eq!(stats["search"]["hits"].as_u64().unwrap(), 1);
    assert_eq!(stats["search"]["misses"].as_u64().unwrap(), 1);
    assert_eq!(stats["search"]["total_entries"].as_u64().unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_searches_hit_upstream_once() {
    let (app, upstream) = create_test_app().await;

    let (a, b) = tokio::join!(
        get(&app, "/api/products/search?q=slow"),
        get(&app, "/api/products/search?q=slow")
    );

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1, b.1);
    assert_eq!(upstream.search_calls(), 1);
}

#[tokio::test]
async fn test_search_invalid_range_is_bad_request() {
    let (app, upstream) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/search?min_price=50&max_price=10").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("min_price"));
    assert_eq!(upstream.search_calls(), 0);
}

#[tokio::test]
async fn test_upstream_error_status_is_passed_through() {
    let (app, upstream) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/search?q=missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("No such category"));
    // Not retried
    assert_eq!(upstream.search_calls(), 1);
}

#[tokio::test]
async fn test_malformed_upstream_body_is_bad_gateway() {
    let (app, _) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/search?q=broken").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("Malformed"));
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let app = app_for(&unused_base_url().await);

    let (status, json) = get(&app, "/api/products/search?q=shoes").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("retries exhausted"));
}

// == Autocomplete Endpoint Tests ==

#[tokio::test]
async fn test_autocomplete_endpoint() {
    let (app, upstream) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/autocomplete?q=ru").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!(["ru shoes", "ru shorts"]));
    assert_eq!(upstream.autocomplete_calls(), 1);
}

#[tokio::test]
async fn test_short_autocomplete_never_reaches_upstream() {
    let (app, upstream) = create_test_app().await;

    for uri in [
        "/api/products/autocomplete",
        "/api/products/autocomplete?q=",
        "/api/products/autocomplete?q=a",
    ] {
        let (status, json) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }
    assert_eq!(upstream.autocomplete_calls(), 0);
}

#[tokio::test]
async fn test_malformed_autocomplete_is_empty_list() {
    let (app, upstream) = create_test_app().await;

    let (status, json) = get(&app, "/api/products/autocomplete?q=bad").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!([]));
    assert_eq!(upstream.autocomplete_calls(), 1);
}

// == Cache Management Tests ==

#[tokio::test]
async fn test_clear_cache_forces_refetch() {
    let (app, upstream) = create_test_app().await;

    get(&app, "/api/products/search?q=shoes").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    get(&app, "/api/products/search?q=shoes").await;
    assert_eq!(upstream.search_calls(), 2);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app().await;

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
    assert!(json.get("timestamp").is_some());
}
