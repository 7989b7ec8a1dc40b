//! Retrying Fetch
//!
//! HTTP GET with per-attempt timeout and exponential backoff. Transport
//! failures and 429 responses are retried; every other status goes back to
//! the caller untouched.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{Result, SearchError};

/// Status the upstream uses for rate limiting
pub const TOO_MANY_REQUESTS: u16 = 429;

// == HTTP Response ==
/// Status, headers and body of a completed request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lowercase
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Delay requested through `Retry-After`, when given in whole seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

// == Transport ==
/// Performs one GET request. Implementations report connection-level
/// problems as [`SearchError::Network`] and never retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// == Retry Policy ==
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff base, doubled on every attempt
    pub initial_delay: Duration,
    /// Budget for a single attempt
    pub request_timeout: Duration,
    /// Longest `Retry-After` wait honoured before the next attempt
    pub max_retry_after: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retry_after(mut self, ceiling: Duration) -> Self {
        self.max_retry_after = ceiling;
        self
    }

    /// `initial_delay * 2^attempt`, saturating.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(300),
            request_timeout: Duration::from_secs(5),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

// == Fetch With Retry ==
/// GETs `url`, retrying transport failures and 429s per `policy`.
///
/// An attempt that outlives `request_timeout` is cancelled and counts as a
/// transport failure. Once `max_retries + 1` attempts have failed the call
/// returns [`SearchError::RetriesExhausted`].
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    url: &str,
    policy: &RetryPolicy,
) -> Result<HttpResponse> {
    let mut last_error = String::new();

    for attempt in 0..=policy.max_retries {
        let outcome = match tokio::time::timeout(policy.request_timeout, transport.get(url)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(SearchError::Timeout(policy.request_timeout)),
        };

        let delay = match outcome {
            Ok(response) if response.status == TOO_MANY_REQUESTS => {
                last_error = "rate limited (429)".to_string();
                response
                    .retry_after()
                    .map(|wait| wait.min(policy.max_retry_after))
                    .unwrap_or_else(|| policy.backoff(attempt))
            }
            Ok(response) => {
                debug!(url, status = response.status, attempt, "fetch completed");
                return Ok(response);
            }
            Err(e) if e.is_transport() => {
                last_error = e.to_string();
                policy.backoff(attempt)
            }
            Err(e) => return Err(e),
        };

        if attempt < policy.max_retries {
            warn!(
                url,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %last_error,
                "fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(SearchError::RetriesExhausted {
        attempts: policy.max_retries + 1,
        last_error,
    })
}
