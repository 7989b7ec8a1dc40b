//! Search Module
//!
//! Client-side search request layer: canonical cache keys, TTL caching,
//! in-flight deduplication and retrying fetches against the storefront API.
//!
//! A call moves through: key built, cache checked, in-flight map checked,
//! then either the shared pending request is awaited or a new fetch starts.
//! A successful fetch populates the cache before returning.

pub mod client;
pub mod inflight;
pub mod models;
pub mod params;
pub mod report;
pub mod retry;


pub use client::{ClientStats, SearchClient, SearchClientBuilder, Suggestions};
pub use inflight::InFlight;
pub use models::{Pagination, PriceRange, ProductSearchResult, SearchFilters, SearchResults};
pub use params::{SearchParams, ALL_KEY, MAX_PAGE_LIMIT};
pub use report::{ErrorReporter, TracingReporter};
pub use retry::{fetch_with_retry, HttpResponse, HttpTransport, RetryPolicy, Transport};
