//! GC Task
//!
//! Background task that periodically garbage collects the cache.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::WeakAppCache;
use crate::tasks::spawn_recurring;

/// Spawns a task that runs a GC pass on `cache` every `interval`.
///
/// The task holds a weak reference and ends on its own once the cache is dropped.
///
/// # Example
/// ```ignore
/// let cache: AppCache<String> = AppCache::new();
/// let gc_handle = spawn_gc_task(cache.downgrade(), Duration::from_secs(60));
/// // Later, during shutdown:
/// gc_handle.abort();
/// ```
pub fn spawn_gc_task<T>(cache: WeakAppCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    spawn_recurring("cache GC", interval, move || {
        let cache = cache.upgrade();
        async move {
            let Some(cache) = cache else {
                return ControlFlow::Break(());
            };

            let removed = cache.collect_garbage().await;
            if removed > 0 {
                info!("Cache GC: removed {} entries", removed);
            } else {
                debug!("Cache GC: nothing to remove");
            }
            ControlFlow::Continue(())
        }
    })
}
