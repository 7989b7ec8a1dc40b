//! In-flight Request Deduplication
//!
//! Concurrent calls for the same key share one pending operation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::Result;

type SharedResult<T> = Shared<BoxFuture<'static, Result<T>>>;

/// Pending operation plus the ticket it was registered under.
struct Pending<T> {
    ticket: u64,
    future: SharedResult<T>,
}

type PendingMap<T> = Arc<Mutex<HashMap<String, Pending<T>>>>;

// == In-flight Map ==
/// Tracks at most one outstanding operation per key.
///
/// Every caller waiting on a key gets the same outcome, error included. The
/// entry is removed as soon as the operation settles, so the next call after
/// that starts fresh.
pub struct InFlight<T> {
    pending: PendingMap<T>,
    next_ticket: AtomicU64,
}

impl<T> InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Awaits the pending operation for `key`, or starts one with `make`.
    ///
    /// A started operation is driven on its own task, so it completes and
    /// clears its entry even if every caller stops waiting.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().await;

            if let Some(existing) = pending.get(key) {
                debug!(key, "joining in-flight request");
                existing.future.clone()
            } else {
                let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                let shared = settle_and_release(Arc::clone(&self.pending), key, ticket, make());

                pending.insert(
                    key.to_string(),
                    Pending {
                        ticket,
                        future: shared.clone(),
                    },
                );
                tokio::spawn(shared.clone());
                debug!(key, "started request");
                shared
            }
        };

        shared.await
    }

    /// Number of keys with an outstanding operation.
    pub async fn pending(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Forgets every pending entry. Callers already waiting still complete.
    pub async fn clear(&self) {
        self.pending.lock().await.clear();
    }
}

impl<T> Default for InFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Wraps `operation` so it drops its own map entry once it settles.
///
/// The ticket check keeps a finished operation from removing a newer one
/// registered under the same key after a `clear`.
fn settle_and_release<T, Fut>(
    pending: PendingMap<T>,
    key: &str,
    ticket: u64,
    operation: Fut,
) -> SharedResult<T>
where
    T: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let key = key.to_string();
    async move {
        let result = operation.await;

        let mut pending = pending.lock().await;
        if pending.get(&key).map(|p| p.ticket) == Some(ticket) {
            pending.remove(&key);
        }

        result
    }
    .boxed()
    .shared()
}
