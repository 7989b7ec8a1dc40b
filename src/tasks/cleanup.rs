//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! The caches only drop stale entries when they are read again, so a
//! long-running gateway needs this sweep to keep memory bounded.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::search::SearchClient;

/// Spawns a background task that periodically sweeps the client's caches.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let client = Arc::new(SearchClient::from_config(&config)?);
/// let cleanup_handle = spawn_cleanup_task(client.clone(), 60);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    client: Arc<SearchClient>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = client.cleanup_expired().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::Result;
    use crate::search::{HttpResponse, SearchParams, Transport};
    use async_trait::async_trait;

    struct EmptyPage;

    #[async_trait]
    impl Transport for EmptyPage {
        async fn get(&self, _url: &str) -> Result<HttpResponse> {
            Ok(HttpResponse::new(
                200,
                r#"{"products": [], "pagination": {"total": 0, "page": 1, "pages": 0}}"#,
            ))
        }
    }

    fn client_on(clock: &ManualClock) -> Arc<SearchClient> {
        Arc::new(
            SearchClient::builder("http://shop.test")
                .transport(Arc::new(EmptyPage))
                .clock(Arc::new(clock.clone()))
                .search_ttl(Duration::from_secs(1))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_removes_expired_entries() {
        let clock = ManualClock::new(0);
        let client = client_on(&clock);
        client
            .search_products(&SearchParams::new().query("expire soon"))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(2));
        let handle = spawn_cleanup_task(client.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let stats = client.stats().await;
        assert_eq!(stats.search.total_entries, 0, "expired entry should be swept");
        assert_eq!(stats.search.expirations, 1);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_preserves_valid_entries() {
        let clock = ManualClock::new(0);
        let client = client_on(&clock);
        client
            .search_products(&SearchParams::new().query("long lived"))
            .await
            .unwrap();

        let handle = spawn_cleanup_task(client.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(client.stats().await.search.total_entries, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let client = client_on(&ManualClock::new(0));

        let handle = spawn_cleanup_task(client, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
