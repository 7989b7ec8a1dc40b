//! Search Client
//!
//! Product search and autocomplete over the storefront API, composed from the
//! TTL cache, the in-flight map and the retrying fetch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheStats, Clock, SystemClock, TtlCache};
use crate::config::Config;
use crate::error::{Result, SearchError};
use crate::search::inflight::InFlight;
use crate::search::models::SearchResults;
use crate::search::params::SearchParams;
use crate::search::report::{ErrorReporter, TracingReporter};
use crate::search::retry::{fetch_with_retry, HttpResponse, HttpTransport, RetryPolicy, Transport};

/// Upstream search endpoint, relative to the base URL
pub const SEARCH_PATH: &str = "api/products/search";

/// Upstream autocomplete endpoint, relative to the base URL
pub const AUTOCOMPLETE_PATH: &str = "api/products/autocomplete";

/// Shortest query autocomplete will send upstream
pub const MIN_AUTOCOMPLETE_CHARS: usize = 2;

type SharedCache<T> = Arc<RwLock<TtlCache<T>>>;

/// Suggestion list shared between callers
pub type Suggestions = Arc<Vec<String>>;

// == Client Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientStats {
    pub search: CacheStats,
    pub autocomplete: CacheStats,
    pub pending_searches: usize,
    pub pending_autocomplete: usize,
}

// == Search Client ==
/// Caching, deduplicating client for the storefront search API.
///
/// Built once by the application and shared behind an `Arc`. Each client
/// owns its caches, so separate instances never share entries.
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    retry: RetryPolicy,
    search_ttl: Duration,
    autocomplete_ttl: Duration,
    search_cache: SharedCache<Arc<SearchResults>>,
    suggestion_cache: SharedCache<Suggestions>,
    search_inflight: InFlight<Arc<SearchResults>>,
    suggestion_inflight: InFlight<Suggestions>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SearchClient {
    pub fn builder(base_url: impl Into<String>) -> SearchClientBuilder {
        SearchClientBuilder::new(base_url)
    }

    /// Builds a client over HTTP from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::builder(config.upstream_base_url.clone())
            .retry_policy(config.retry_policy())
            .search_ttl(config.search_cache_ttl())
            .autocomplete_ttl(config.autocomplete_cache_ttl())
            .build()
    }

    // == Search Products ==
    /// Returns a page of products matching `params`.
    ///
    /// Served from cache when a fresh entry exists. Otherwise joins any
    /// identical request already in flight, or fetches with retry and caches
    /// the decoded page.
    pub async fn search_products(&self, params: &SearchParams) -> Result<Arc<SearchResults>> {
        self.run_search(params)
            .await
            .map_err(|e| {
                self.reporter.report("search_products", &e);
                e
            })
    }

    async fn run_search(&self, params: &SearchParams) -> Result<Arc<SearchResults>> {
        params.validate()?;
        let key = params.cache_key();

        if let Some(hit) = self.search_cache.write().await.get(&key) {
            debug!(key = %key, "search cache hit");
            return Ok(hit);
        }

        let url = self.endpoint(SEARCH_PATH, &params.query_pairs())?;
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.search_cache);
        let policy = self.retry;
        let ttl = self.search_ttl;
        let cache_key = key.clone();

        self.search_inflight
            .run(&key, move || async move {
                let response = fetch_with_retry(transport.as_ref(), url.as_str(), &policy).await?;
                let results: SearchResults = decode_json(&response)?;
                let results = Arc::new(results);

                store(&cache, cache_key, Arc::clone(&results), ttl).await;
                Ok(results)
            })
            .await
    }

    // == Autocomplete ==
    /// Returns name suggestions for a partial query.
    ///
    /// Queries shorter than two characters return an empty list without any
    /// request. A body that cannot be decoded also yields an empty list, which
    /// is not cached.
    pub async fn autocomplete(&self, query: &str) -> Result<Suggestions> {
        self.run_autocomplete(query)
            .await
            .map_err(|e| {
                self.reporter.report("autocomplete", &e);
                e
            })
    }

    async fn run_autocomplete(&self, query: &str) -> Result<Suggestions> {
        let query = query.trim();
        if query.chars().count() < MIN_AUTOCOMPLETE_CHARS {
            return Ok(Arc::new(Vec::new()));
        }

        let key = format!("ac:{}", query);
        if let Some(hit) = self.suggestion_cache.write().await.get(&key) {
            debug!(key = %key, "autocomplete cache hit");
            return Ok(hit);
        }

        let url = self.endpoint(AUTOCOMPLETE_PATH, &[("q", query.to_string())])?;
        let transport = Arc::clone(&self.transport);
        let cache = Arc::clone(&self.suggestion_cache);
        let reporter = Arc::clone(&self.reporter);
        let policy = self.retry;
        let ttl = self.autocomplete_ttl;
        let cache_key = key.clone();

        self.suggestion_inflight
            .run(&key, move || async move {
                let response = fetch_with_retry(transport.as_ref(), url.as_str(), &policy).await?;

                match decode_json::<Vec<String>>(&response) {
                    Ok(suggestions) => {
                        let suggestions = Arc::new(suggestions);
                        store(&cache, cache_key, Arc::clone(&suggestions), ttl).await;
                        Ok(suggestions)
                    }
                    Err(e @ SearchError::MalformedResponse(_)) => {
                        reporter.report("autocomplete", &e);
                        Ok(Arc::new(Vec::new()))
                    }
                    Err(e) => Err(e),
                }
            })
            .await
    }

    // == Cache Management ==
    /// Drops the cached page for `params`. Returns true if one was cached.
    pub async fn invalidate(&self, params: &SearchParams) -> bool {
        self.search_cache.write().await.remove(&params.cache_key())
    }

    /// Empties both caches and forgets in-flight requests.
    pub async fn clear(&self) {
        self.search_cache.write().await.clear();
        self.suggestion_cache.write().await.clear();
        self.search_inflight.clear().await;
        self.suggestion_inflight.clear().await;
        debug!("search client caches cleared");
    }

    /// Sweeps expired entries from both caches. Returns how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let searches = self.search_cache.write().await.cleanup_expired();
        let suggestions = self.suggestion_cache.write().await.cleanup_expired();
        searches + suggestions
    }

    pub async fn stats(&self) -> ClientStats {
        ClientStats {
            search: self.search_cache.read().await.stats(),
            autocomplete: self.suggestion_cache.read().await.stats(),
            pending_searches: self.search_inflight.pending().await,
            pending_autocomplete: self.suggestion_inflight.pending().await,
        }
    }

    fn endpoint(&self, path: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| SearchError::InvalidRequest(format!("Invalid endpoint {}: {}", path, e)))?;

        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (name, value) in pairs {
                query.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

// == Builder ==
pub struct SearchClientBuilder {
    base_url: String,
    transport: Option<Arc<dyn Transport>>,
    retry: RetryPolicy,
    search_ttl: Duration,
    autocomplete_ttl: Duration,
    clock: Arc<dyn Clock>,
    reporter: Arc<dyn ErrorReporter>,
}

impl SearchClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        let defaults = Config::default();
        Self {
            base_url: base_url.into(),
            transport: None,
            retry: defaults.retry_policy(),
            search_ttl: defaults.search_cache_ttl(),
            autocomplete_ttl: defaults.autocomplete_cache_ttl(),
            clock: Arc::new(SystemClock),
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Replaces the default `reqwest` transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = ttl;
        self
    }

    pub fn autocomplete_ttl(mut self, ttl: Duration) -> Self {
        self.autocomplete_ttl = ttl;
        self
    }

    /// Time source for both caches.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn build(self) -> Result<SearchClient> {
        let mut base = self.base_url.trim().to_string();
        // Relative endpoint paths must land under the base path
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            SearchError::InvalidRequest(format!("Invalid base URL {}: {}", self.base_url, e))
        })?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(HttpTransport::default()));

        Ok(SearchClient {
            transport,
            base_url,
            retry: self.retry,
            search_ttl: self.search_ttl,
            autocomplete_ttl: self.autocomplete_ttl,
            search_cache: Arc::new(RwLock::new(TtlCache::with_clock(Arc::clone(&self.clock)))),
            suggestion_cache: Arc::new(RwLock::new(TtlCache::with_clock(self.clock))),
            search_inflight: InFlight::new(),
            suggestion_inflight: InFlight::new(),
            reporter: self.reporter,
        })
    }
}

// == Response Handling ==
/// Writes to the cache; a rejected key only costs the cache entry.
async fn store<T: Clone>(cache: &SharedCache<T>, key: String, value: T, ttl: Duration) {
    if let Err(e) = cache.write().await.set(key, value, ttl) {
        warn!(error = %e, "result not cached");
    }
}

/// Checks the status, then decodes the JSON body.
fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    if !response.is_success() {
        return Err(SearchError::Http {
            status: response.status,
            message: error_message(response),
        });
    }
    if response.body.trim().is_empty() {
        return Err(SearchError::MalformedResponse(
            "empty response body".to_string(),
        ));
    }
    serde_json::from_str(&response.body).map_err(|e| SearchError::MalformedResponse(e.to_string()))
}

/// Upstream `message`/`error` field, else the status reason.
fn error_message(response: &HttpResponse) -> String {
    let from_body = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| {
            ["message", "error"]
                .iter()
                .find_map(|field| body.get(*field).and_then(|v| v.as_str()).map(String::from))
        });

    from_body.unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(response.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Request failed")
            .to_string()
    })
}
