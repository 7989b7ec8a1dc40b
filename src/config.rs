//! Configuration Module
//!
//! Handles loading and managing gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::search::RetryPolicy;

/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the storefront API
    pub upstream_base_url: String,
    /// TTL for cached search pages, in milliseconds
    pub search_cache_ttl_ms: u64,
    /// TTL for cached autocomplete suggestions, in milliseconds
    pub autocomplete_cache_ttl_ms: u64,
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Backoff base in milliseconds
    pub initial_retry_delay_ms: u64,
    /// Per-attempt timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Ceiling on a server-requested `Retry-After` wait, in milliseconds
    pub max_retry_after_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_BASE_URL` - Storefront API base (default: http://127.0.0.1:5000)
    /// - `SEARCH_CACHE_TTL_MS` - Search page TTL (default: 300000)
    /// - `AUTOCOMPLETE_CACHE_TTL_MS` - Suggestion TTL (default: 60000)
    /// - `MAX_RETRIES` - Retries per request (default: 3)
    /// - `INITIAL_RETRY_DELAY_MS` - Backoff base (default: 300)
    /// - `REQUEST_TIMEOUT_MS` - Per-attempt timeout (default: 5000)
    /// - `MAX_RETRY_AFTER_MS` - Longest honoured `Retry-After` (default: 30000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expired entry sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_base_url),
            search_cache_ttl_ms: env_or("SEARCH_CACHE_TTL_MS", defaults.search_cache_ttl_ms),
            autocomplete_cache_ttl_ms: env_or(
                "AUTOCOMPLETE_CACHE_TTL_MS",
                defaults.autocomplete_cache_ttl_ms,
            ),
            max_retries: env_or("MAX_RETRIES", defaults.max_retries),
            initial_retry_delay_ms: env_or(
                "INITIAL_RETRY_DELAY_MS",
                defaults.initial_retry_delay_ms,
            ),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),
            max_retry_after_ms: env_or("MAX_RETRY_AFTER_MS", defaults.max_retry_after_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.search_cache_ttl_ms)
    }

    pub fn autocomplete_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.autocomplete_cache_ttl_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.initial_retry_delay_ms),
        )
        .with_request_timeout(Duration::from_millis(self.request_timeout_ms))
        .with_max_retry_after(Duration::from_millis(self.max_retry_after_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_base_url: "http://127.0.0.1:5000".to_string(),
            search_cache_ttl_ms: 5 * 60 * 1000,
            autocomplete_cache_ttl_ms: 60 * 1000,
            max_retries: 3,
            initial_retry_delay_ms: 300,
            request_timeout_ms: 5000,
            max_retry_after_ms: 30_000,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

/// Parses `name` from the environment, falling back on absence or bad input.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.upstream_base_url, "http://127.0.0.1:5000");
        assert_eq!(config.search_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.autocomplete_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 60);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = Config::default().retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(300));
        assert_eq!(policy.request_timeout, Duration::from_secs(5));
        assert_eq!(policy.max_retry_after, Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "UPSTREAM_BASE_URL",
            "SEARCH_CACHE_TTL_MS",
            "AUTOCOMPLETE_CACHE_TTL_MS",
            "MAX_RETRIES",
            "INITIAL_RETRY_DELAY_MS",
            "REQUEST_TIMEOUT_MS",
            "MAX_RETRY_AFTER_MS",
            "SERVER_PORT",
            "CLEANUP_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.upstream_base_url, "http://127.0.0.1:5000");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.request_timeout_ms, 5000);
    }

    #[test]
    fn test_env_or_ignores_garbage() {
        env::set_var("STOREFRONT_SEARCH_TEST_PORT", "not-a-port");
        assert_eq!(env_or("STOREFRONT_SEARCH_TEST_PORT", 8080u16), 8080);

        env::set_var("STOREFRONT_SEARCH_TEST_PORT", " 9090 ");
        assert_eq!(env_or("STOREFRONT_SEARCH_TEST_PORT", 8080u16), 9090);

        env::remove_var("STOREFRONT_SEARCH_TEST_PORT");
    }
}
