//! Storefront Search - product search layer for the storefront API
//!
//! Canonical cache keys, TTL caching, in-flight request deduplication and
//! retrying fetches, plus an HTTP gateway that serves them.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, SearchError};
pub use search::{SearchClient, SearchParams, SearchResults};
pub use tasks::spawn_cleanup_task;
