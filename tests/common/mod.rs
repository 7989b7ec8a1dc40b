//! In-process storefront API used as the upstream in integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

/// Call counters and knobs shared with the running upstream.
#[derive(Clone, Default)]
pub struct Upstream {
    pub search_calls: Arc<AtomicUsize>,
    pub autocomplete_calls: Arc<AtomicUsize>,
    /// Number of 429 answers left for `q=throttled`
    pub throttle_remaining: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }
}

/// Starts the upstream on an ephemeral port and returns its base URL.
pub async fn spawn_upstream() -> (String, Upstream) {
    let upstream = Upstream::default();
    let app = Router::new()
        .route("/api/products/search", get(search))
        .route("/api/products/autocomplete", get(autocomplete))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), upstream)
}

/// Base URL where nothing is listening.
pub async fn unused_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn search(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.search_calls.fetch_add(1, Ordering::SeqCst);
    let query = params.get("q").cloned().unwrap_or_default();
    let page: u32 = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1);

    match query.as_str() {
        "broken" => return (StatusCode::OK, "<html>oops</html>").into_response(),
        "missing" => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "No such category"})),
            )
                .into_response()
        }
        "throttled" => {
            let throttled = upstream
                .throttle_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if throttled {
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    [(header::RETRY_AFTER, "1")],
                    Json(json!({"message": "Too many requests"})),
                )
                    .into_response();
            }
        }
        "slow" => tokio::time::sleep(Duration::from_millis(100)).await,
        "hang" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    Json(json!({
        "products": [{
            "_id": "p1",
            "name": format!("{} result", query),
            "price": 49.99,
            "colors": params.get("colors").map(|c| c.split(',').collect::<Vec<_>>()).unwrap_or_default(),
        }],
        "pagination": {"total": 1, "page": page, "pages": 1},
        "filters": {"categories": ["shoes"], "colors": ["red", "blue"], "sizes": []}
    }))
    .into_response()
}

async fn autocomplete(
    State(upstream): State<Upstream>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    upstream.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
    let query = params.get("q").cloned().unwrap_or_default();

    if query == "bad" {
        return (StatusCode::OK, "").into_response();
    }

    Json(vec![format!("{} shoes", query), format!("{} shorts", query)]).into_response()
}
