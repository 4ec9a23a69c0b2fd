//! Cache Statistics Report Task
//!
//! Background task that periodically logs a snapshot of cache activity.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::CacheStore;

/// Spawns a background task that logs cache statistics every
/// `interval_secs` seconds.
///
/// The task only reads counters and slot occupancy; it never promotes or
/// evicts entries.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::new(10, 102_400));
/// let report_handle = spawn_stats_reporter(cache.clone(), 60);
/// // Later, during shutdown:
/// report_handle.abort();
/// ```
pub fn spawn_stats_reporter(cache: Arc<CacheStore>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache stats report with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let stats = cache.stats().await;
            match serde_json::to_string(&stats) {
                Ok(json) => info!(hit_rate = stats.hit_rate(), "Cache stats: {}", json),
                Err(e) => warn!(error = %e, "Could not serialize cache stats"),
            }
        }
    })
}
