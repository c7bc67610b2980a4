//! Expired Entry Reaper
//!
//! Background task that periodically deletes stale cache entries, so records
//! nobody asks for again do not linger in the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;

/// Spawns a background task that periodically removes expired entries.
///
/// The task sleeps for `interval` between runs. Store failures are logged
/// and the next run tries again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_reaper_task(state.cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_reaper_task(cache: Arc<CacheEngine>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting reaper task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            match cache.reap_expired().await {
                Ok(0) => debug!("Reaper: no expired entries found"),
                Ok(removed) => info!("Reaper: removed {} expired entries", removed),
                Err(e) => warn!("Reaper run failed: {}", e),
            }
        }
    })
}
