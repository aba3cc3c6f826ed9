//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries, and the
//! lifecycle handle that owns it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, SharedCache};

/// Shortest sweep period accepted; a zero interval would spin.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Spawns a background task that sweeps expired entries every `interval`.
///
/// The task runs until its handle is aborted. Each pass takes the write lock
/// only for the duration of `cleanup()`.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(RwLock::new(CacheStore::<String>::new(CacheLimits::default())));
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(30));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task<V>(cache: SharedCache<V>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.max(MIN_SWEEP_INTERVAL);

    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut guard = cache.write().await;
                guard.cleanup()
            };

            if removed > 0 {
                info!(removed, "cache sweep removed expired entries");
            } else {
                debug!("cache sweep found no expired entries");
            }
        }
    })
}

// == Managed Cache ==
/// Owns a shared cache store together with its sweep task.
///
/// The sweep starts in [`ManagedCache::start`] and stops in
/// [`ManagedCache::destroy`], which may be called any number of times but
/// acts only once.
#[derive(Debug)]
pub struct ManagedCache<V> {
    store: SharedCache<V>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> ManagedCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Wraps `store` and starts sweeping at its configured interval.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(store: CacheStore<V>) -> Self {
        let interval = store.limits().sweep_interval;
        let store = Arc::new(RwLock::new(store));
        let handle = spawn_sweep_task(store.clone(), interval);

        Self {
            store,
            sweeper: Mutex::new(Some(handle)),
        }
    }

    /// Returns the shared store handle.
    pub fn store(&self) -> SharedCache<V> {
        self.store.clone()
    }

    /// Runs a sweep immediately, e.g. under memory pressure.
    pub async fn cleanup_now(&self) -> usize {
        let removed = self.store.write().await.cleanup();
        debug!(removed, "on-demand cache sweep");
        removed
    }

    /// Returns whether `destroy` has already run.
    pub async fn is_destroyed(&self) -> bool {
        self.sweeper.lock().await.is_none()
    }

    /// Stops the sweep task and clears the store.
    pub async fn destroy(&self) {
        let Some(handle) = self.sweeper.lock().await.take() else {
            debug!("cache already destroyed");
            return;
        };

        handle.abort();
        self.store.write().await.clear();
        info!("cache destroyed, sweep task stopped");
    }
}

impl<V> Drop for ManagedCache<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
