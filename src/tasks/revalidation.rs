//! Revalidation Task
//!
//! Background task that asks the scheduler which keys are due and refreshes them.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::WeakAppCache;
use crate::tasks::spawn_recurring;

/// Spawns the revalidation tick for `cache`, running every `interval`.
///
/// Each tick only dispatches refreshes (after their priority delay); it never
/// waits for a fetcher to finish.
pub fn spawn_revalidation_task<T>(cache: WeakAppCache<T>, interval: Duration) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    spawn_recurring("revalidation", interval, move || {
        let cache = cache.upgrade();
        async move {
            let Some(cache) = cache else {
                return ControlFlow::Break(());
            };

            let dispatched = cache.revalidate_due().await;
            if dispatched > 0 {
                debug!("Revalidation tick: dispatched {} refreshes", dispatched);
            }
            ControlFlow::Continue(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{AppCache, CacheOptions, Priority, RevalidationStrategy};

    #[tokio::test(start_paused = true)]
    async fn test_revalidation_task_refreshes_due_key() {
        let cache: AppCache<u32> = AppCache::new();
        cache.set("settings", 1, CacheOptions::new()).await;
        cache
            .schedule_revalidation(
                "settings",
                RevalidationStrategy::new(Duration::from_secs(2), || async { Ok(2) })
                    .with_priority(Priority::High),
            )
            .await;

        let handle = spawn_revalidation_task(cache.downgrade(), Duration::from_secs(1));

        // Ticks at 1s and 2s see an entry too young; the 3s tick refreshes it
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(cache.peek("settings").await, Some(1));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(cache.peek("settings").await, Some(2));

        handle.abort();
    }
}
