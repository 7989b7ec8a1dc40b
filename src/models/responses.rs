//! Response DTOs for the search gateway API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::search::ClientStats;

/// Per-cache figures in the stats response
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<&CacheStats> for CacheStatsBody {
    fn from(stats: &CacheStats) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub search: CacheStatsBody,
    pub autocomplete: CacheStatsBody,
    /// Upstream requests currently shared by waiting callers
    pub pending_searches: usize,
    pub pending_autocomplete: usize,
}

impl From<ClientStats> for StatsResponse {
    fn from(stats: ClientStats) -> Self {
        Self {
            search: CacheStatsBody::from(&stats.search),
            autocomplete: CacheStatsBody::from(&stats.autocomplete),
            pending_searches: stats.pending_searches,
            pending_autocomplete: stats.pending_autocomplete,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearedResponse {
    pub message: String,
}

impl CacheClearedResponse {
    pub fn new() -> Self {
        Self {
            message: "Search caches cleared".to_string(),
        }
    }
}

impl Default for CacheClearedResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
