//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    AutocompleteQuery, CacheClearedResponse, HealthResponse, SearchQuery, StatsResponse,
};
use crate::search::{SearchClient, SearchResults};

/// Application state shared across all handlers.
///
/// The search client synchronizes its own caches, so handlers share it
/// through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SearchClient>,
}

impl AppState {
    pub fn new(client: SearchClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(SearchClient::from_config(config)?))
    }
}

/// Handler for GET /api/products/search
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>> {
    let params = query.into_params();
    let results = state.client.search_products(&params).await?;

    Ok(Json(SearchResults::clone(&results)))
}

/// Handler for GET /api/products/autocomplete
pub async fn autocomplete_handler(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<Vec<String>>> {
    let q = query.q.unwrap_or_default();
    let suggestions = state.client.autocomplete(&q).await?;

    Ok(Json(suggestions.as_ref().clone()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.client.stats().await))
}

/// Handler for DELETE /cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<CacheClearedResponse> {
    state.client.clear().await;
    Json(CacheClearedResponse::new())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
