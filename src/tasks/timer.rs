//! Timer Primitives
//!
//! A recurring timer and a one-shot deferred timer over tokio tasks.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Spawns a task that runs `job` every `period`, starting one period from now.
///
/// The loop ends when `job` returns `ControlFlow::Break`, or when the returned
/// handle is aborted.
///
/// # Arguments
/// * `name` - Task name used in log lines
/// * `period` - Sleep between runs
/// * `job` - Produces the future for one run
pub fn spawn_recurring<F, Fut>(name: &'static str, period: Duration, mut job: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting {} task with period of {} ms",
            name,
            period.as_millis()
        );

        loop {
            tokio::time::sleep(period).await;

            if job().await.is_break() {
                debug!("{} task finished", name);
                break;
            }
        }
    })
}

/// Spawns `task` to run once after `delay`. A zero delay runs it on the next turn.
pub fn spawn_deferred<Fut>(delay: Duration, task: Fut) -> JoinHandle<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        task.await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_recurring_runs_each_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let handle = spawn_recurring("test", Duration::from_secs(1), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_recurring_stops_on_break() {
        let handle = spawn_recurring("once", Duration::from_secs(1), || async {
            ControlFlow::Break(())
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_waits_for_delay() {
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);

        let handle = spawn_deferred(Duration::from_secs(5), async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_recurring_can_be_aborted() {
        let handle = spawn_recurring("abort", Duration::from_secs(1), || async {
            ControlFlow::Continue(())
        });

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
