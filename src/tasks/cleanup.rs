//! TTL Sweep Task
//!
//! Background task that periodically removes expired pages from the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically purges expired cache entries.
///
/// Reads already treat expired entries as absent; the sweep only reclaims the
/// memory of pages nobody asks for again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let store = Arc::new(CacheStore::new(1000, Duration::from_secs(300)));
/// let sweep = spawn_cleanup_task(store.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<CacheStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs_f64(),
            "Starting TTL sweep task"
        );

        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = store.purge_expired();

            if removed > 0 {
                info!(removed, remaining = store.len(), "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
