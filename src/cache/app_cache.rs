//! Cache Facade
//!
//! The public surface of the cache: reads with fetch-on-miss and
//! stale-while-revalidate, writes, invalidation, stats and the background
//! task lifecycle.

use std::future::Future;
use std::mem;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheOptions, CacheStore, RevalidationScheduler, RevalidationStrategy, StatsSnapshot,
};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_deferred, spawn_gc_task, spawn_revalidation_task};

struct Shared<T> {
    store: RwLock<CacheStore<T>>,
    scheduler: RwLock<RevalidationScheduler<T>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    gc_interval: Duration,
    revalidation_interval: Duration,
}

// == App Cache ==
/// Tag-indexed TTL cache shared by cloning.
///
/// Lock order is scheduler before store; every store mutation happens inside
/// one write-lock critical section.
pub struct AppCache<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for AppCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning handle held by background tasks.
pub struct WeakAppCache<T>(Weak<Shared<T>>);

impl<T> WeakAppCache<T> {
    pub fn upgrade(&self) -> Option<AppCache<T>> {
        self.0.upgrade().map(|inner| AppCache { inner })
    }
}

impl<T> Default for AppCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AppCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates a cache with the default configuration. Background tasks are not running.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Creates a cache sized and timed by `config`.
    pub fn from_config(config: &Config) -> Self {
        let store = CacheStore::new(
            config.max_size,
            config.gc_threshold,
            Duration::from_secs(config.default_ttl),
        );
        Self {
            inner: Arc::new(Shared {
                store: RwLock::new(store),
                scheduler: RwLock::new(RevalidationScheduler::new()),
                tasks: Mutex::new(Vec::new()),
                gc_interval: Duration::from_secs(config.gc_interval),
                revalidation_interval: Duration::from_secs(config.revalidation_interval),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakAppCache<T> {
        WeakAppCache(Arc::downgrade(&self.inner))
    }

    // == Lifecycle ==
    /// Starts the GC and revalidation ticks. Calling it again while running is a no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.is_empty() {
            debug!("Cache background tasks already running");
            return;
        }

        tasks.push(spawn_gc_task(self.downgrade(), self.inner.gc_interval));
        tasks.push(spawn_revalidation_task(
            self.downgrade(),
            self.inner.revalidation_interval,
        ));
        info!(
            "Cache background tasks started (gc every {}s, revalidation every {}s)",
            self.inner.gc_interval.as_secs(),
            self.inner.revalidation_interval.as_secs()
        );
    }

    /// Aborts the background ticks. Refreshes already dispatched run to completion.
    pub fn stop(&self) {
        let handles = {
            let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            mem::take(&mut *tasks)
        };
        if handles.is_empty() {
            return;
        }
        for handle in handles {
            handle.abort();
        }
        info!("Cache background tasks stopped");
    }

    pub fn is_running(&self) -> bool {
        !self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    // == Get ==
    /// Returns the cached value for `key`, fetching it on a miss or hard expiry.
    ///
    /// With `revalidate_on_stale`, a hit in the last 20% of the TTL starts one
    /// background refresh and still returns the cached value at once. If a
    /// refresh for `key` is already in flight, a miss waits for it instead of
    /// fetching again.
    ///
    /// # Errors
    /// `CacheError::FetchFailed` when the fetcher fails and no entry, not even
    /// an expired one, exists. Otherwise the stale value is returned.
    pub async fn get<F, Fut>(&self, key: &str, fetcher: F, options: CacheOptions) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let guard = loop {
            let now = Instant::now();
            let mut store = self.inner.store.write().await;

            let hit = store
                .get(key)
                .filter(|entry| !entry.is_expired_at(now))
                .map(|entry| (entry.data.clone(), entry.is_approaching_expiry(now)));

            if let Some((data, approaching)) = hit {
                store.stats_mut().record_hit();
                if options.revalidate_on_stale && approaching {
                    if let Some(marker) = store.try_acquire(key) {
                        drop(store);
                        debug!(key, "Cache HIT (approaching expiry), refreshing in background");
                        let guard = InFlightGuard::new(&self.inner, key, marker);
                        self.spawn_refresh(guard, fetcher(), options, Duration::ZERO);
                        return Ok(data);
                    }
                }
                debug!(key, "Cache HIT");
                return Ok(data);
            }

            if let Some(mut released) = store.subscribe(key) {
                drop(store);
                debug!(key, "Cache MISS, waiting for in-flight refresh");
                // Err only means the marker's sender is gone, which is the signal itself
                let _ = released.changed().await;
                continue;
            }

            let Some(marker) = store.try_acquire(key) else {
                continue;
            };
            store.stats_mut().record_miss();
            break InFlightGuard::new(&self.inner, key, marker);
        };

        debug!(key, "Cache MISS, fetching");
        let outcome = fetcher().await;

        let now = Instant::now();
        let mut store = self.inner.store.write().await;
        let owned = guard.release(&mut store);
        match outcome {
            Ok(data) => {
                if owned {
                    store.set(key, data.clone(), &options, now);
                } else {
                    debug!(key, "Key invalidated during fetch, result not cached");
                }
                Ok(data)
            }
            Err(source) => match store.get(key) {
                Some(entry) => {
                    warn!(key, "Fetch failed, serving stale value: {:#}", source);
                    Ok(entry.data.clone())
                }
                None => Err(CacheError::FetchFailed {
                    key: key.to_string(),
                    source,
                }),
            },
        }
    }

    // == Peek ==
    /// Returns the value for `key` if a valid entry exists, without fetching.
    pub async fn peek(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let mut store = self.inner.store.write().await;
        let data = store
            .get(key)
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| entry.data.clone());

        match data {
            Some(_) => store.stats_mut().record_hit(),
            None => store.stats_mut().record_miss(),
        }
        data
    }

    // == Set ==
    /// Stores `data` under `key`, replacing any previous entry and its tags.
    ///
    /// Runs a GC pass before returning once the store exceeds its threshold.
    pub async fn set(&self, key: &str, data: T, options: CacheOptions) {
        let now = Instant::now();
        let removed = self.inner.store.write().await.set(key, data, &options, now);
        if removed > 0 {
            info!("Cache over threshold, GC removed {} entries", removed);
        }
    }

    // == Invalidate ==
    /// Removes `key`, its tag associations and any in-flight marker.
    ///
    /// Returns whether an entry existed.
    pub async fn invalidate(&self, key: &str) -> bool {
        let removed = self.inner.store.write().await.remove(key);
        debug!(key, removed, "Invalidated key");
        removed
    }

    /// Removes every entry carrying any of `tags`. Unknown tags are ignored.
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_by_tags<I, S>(&self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let removed = self.inner.store.write().await.remove_by_tags(tags);
        debug!(removed, "Invalidated entries by tag");
        removed
    }

    /// Empties entries, tag index and in-flight markers.
    pub async fn clear(&self) {
        self.inner.store.write().await.clear();
        info!("Cache cleared");
    }

    // == Stats ==
    pub async fn stats(&self) -> StatsSnapshot {
        let scheduled = self.inner.scheduler.read().await.len();
        self.inner.store.read().await.snapshot(Instant::now(), scheduled)
    }

    /// Number of entries held, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.store.read().await.is_empty()
    }

    // == Revalidation ==
    /// Registers a background refresh policy for `key`, replacing any previous one.
    pub async fn schedule_revalidation(&self, key: &str, strategy: RevalidationStrategy<T>) {
        debug!(key, ?strategy, "Scheduled revalidation");
        self.inner.scheduler.write().await.schedule(key, strategy);
    }

    /// Stops future revalidation of `key`. Returns whether a strategy existed.
    pub async fn remove_revalidation(&self, key: &str) -> bool {
        self.inner.scheduler.write().await.remove(key)
    }

    /// Runs one revalidation tick and dispatches the refreshes that are due.
    ///
    /// Returns the number of refreshes dispatched.
    pub async fn revalidate_due(&self) -> usize {
        let planned = {
            let mut scheduler = self.inner.scheduler.write().await;
            let mut store = self.inner.store.write().await;
            scheduler.plan(&mut store, Instant::now())
        };

        let dispatched = planned.len();
        for refresh in planned {
            debug!(
                key = %refresh.key,
                delay_ms = refresh.delay.as_millis() as u64,
                "Dispatching scheduled refresh"
            );
            let guard = InFlightGuard::new(&self.inner, &refresh.key, refresh.marker);
            let fetcher = refresh.fetcher;
            self.spawn_refresh(
                guard,
                async move { fetcher().await },
                refresh.options,
                refresh.delay,
            );
        }
        dispatched
    }

    // == Garbage Collection ==
    /// Runs one GC pass now. Returns the number of entries removed.
    pub async fn collect_garbage(&self) -> usize {
        let mut store = self.inner.store.write().await;
        crate::cache::gc::collect(&mut store, Instant::now())
    }

    // == Background Refresh ==
    fn spawn_refresh<Fut>(
        &self,
        guard: InFlightGuard<T>,
        fetch: Fut,
        options: CacheOptions,
        delay: Duration,
    ) -> JoinHandle<()>
    where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let cache = self.clone();
        spawn_deferred(delay, async move {
            let outcome = fetch.await;
            cache.complete_refresh(guard, outcome, &options).await;
        })
    }

    /// Writes a background result back. Failures are logged and leave the
    /// previous entry untouched.
    async fn complete_refresh(
        &self,
        guard: InFlightGuard<T>,
        outcome: anyhow::Result<T>,
        options: &CacheOptions,
    ) {
        let key = guard.key.clone();
        let now = Instant::now();
        let mut store = self.inner.store.write().await;
        let owned = guard.release(&mut store);

        match outcome {
            Ok(data) if owned => {
                store.set(&key, data, options, now);
                store.stats_mut().record_revalidation();
                debug!(key = %key, "Background refresh stored");
            }
            Ok(_) => {
                debug!(key = %key, "Key invalidated during refresh, result dropped");
            }
            Err(error) => {
                store.stats_mut().record_revalidation_failure();
                warn!(
                    key = %key,
                    "Background refresh failed, keeping previous value: {:#}", error
                );
            }
        }
    }
}

// == In-Flight Guard ==
/// Owns an in-flight marker until released.
///
/// If dropped unreleased (panicking fetcher, cancelled caller, aborted task)
/// the marker is released from `Drop`, so waiters never hang.
struct InFlightGuard<T: Send + Sync + 'static> {
    shared: Arc<Shared<T>>,
    key: String,
    marker: u64,
    armed: bool,
}

impl<T: Send + Sync + 'static> InFlightGuard<T> {
    fn new(shared: &Arc<Shared<T>>, key: &str, marker: u64) -> Self {
        Self {
            shared: Arc::clone(shared),
            key: key.to_string(),
            marker,
            armed: true,
        }
    }

    /// Releases the marker; false when it had been revoked meanwhile.
    fn release(mut self, store: &mut CacheStore<T>) -> bool {
        self.armed = false;
        store.release(&self.key, self.marker)
    }
}

impl<T: Send + Sync + 'static> Drop for InFlightGuard<T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let key = mem::take(&mut self.key);
        let marker = self.marker;
        if let Ok(mut store) = self.shared.store.try_write() {
            store.release(&key, marker);
            return;
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let shared = Arc::clone(&self.shared);
            handle.spawn(async move {
                shared.store.write().await.release(&key, marker);
            });
        }
    }
}
