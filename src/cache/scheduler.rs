//! Revalidation Scheduler
//!
//! Per-key refresh policies and the tick logic deciding which keys are due.
//!
//! Each strategy carries its own fetcher, so a scheduled refresh really
//! re-fetches the value instead of only flagging the key.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheOptions, CacheStore};

/// Boxed future returned by stored fetchers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send>>;

/// Reusable fetcher producing a fresh value on every call.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Gate evaluated on each tick before a refresh is scheduled.
pub type Condition = Arc<dyn Fn() -> bool + Send + Sync>;

// == Priority ==
/// Staggers refreshes that become due on the same tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Delay between the tick that picks a key and the refresh itself.
    pub fn delay(self) -> Duration {
        match self {
            Priority::High => Duration::ZERO,
            Priority::Medium => Duration::from_secs(1),
            Priority::Low => Duration::from_secs(5),
        }
    }
}

// == Revalidation Strategy ==
/// How and when a key gets refreshed independently of read traffic.
pub struct RevalidationStrategy<T> {
    /// Minimum entry age before a refresh is due
    pub interval: Duration,
    /// Optional gate; absent means always eligible
    pub condition: Option<Condition>,
    pub priority: Priority,
    pub fetcher: Fetcher<T>,
}

impl<T> RevalidationStrategy<T> {
    /// Creates a medium-priority strategy with no condition.
    pub fn new<F, Fut>(interval: Duration, fetcher: F) -> Self
    where
        T: 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            interval,
            condition: None,
            priority: Priority::default(),
            fetcher: Arc::new(move || -> BoxFuture<T> { Box::pin(fetcher()) }),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_condition<C>(mut self, condition: C) -> Self
    where
        C: Fn() -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    fn condition_holds(&self) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition())
    }
}

impl<T> Clone for RevalidationStrategy<T> {
    fn clone(&self) -> Self {
        Self {
            interval: self.interval,
            condition: self.condition.clone(),
            priority: self.priority,
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

impl<T> fmt::Debug for RevalidationStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevalidationStrategy")
            .field("interval", &self.interval)
            .field("has_condition", &self.condition.is_some())
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

// == Planned Refresh ==
/// A refresh picked by a tick. The in-flight marker `marker` is already held.
pub struct PlannedRefresh<T> {
    pub key: String,
    pub marker: u64,
    pub delay: Duration,
    pub fetcher: Fetcher<T>,
    /// TTL and tags of the entry being replaced
    pub options: CacheOptions,
}

// == Revalidation Scheduler ==
/// Mapping from key to its revalidation strategy.
pub struct RevalidationScheduler<T> {
    strategies: HashMap<String, RevalidationStrategy<T>>,
}

impl<T> Default for RevalidationScheduler<T> {
    fn default() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }
}

impl<T> RevalidationScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the strategy for `key`.
    pub fn schedule(&mut self, key: &str, strategy: RevalidationStrategy<T>) {
        self.strategies.insert(key.to_string(), strategy);
    }

    /// Stops future scheduling for `key`. A refresh already dispatched still runs.
    pub fn remove(&mut self, key: &str) -> bool {
        self.strategies.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    // == Plan ==
    /// Runs one scheduling decision over every registered key.
    ///
    /// Keys whose entry is gone are dropped. A key is due when its entry is
    /// older than the interval, the condition holds and no refresh is in
    /// flight; its marker is claimed here so the delay window cannot double
    /// schedule it.
    pub fn plan(&mut self, store: &mut CacheStore<T>, now: Instant) -> Vec<PlannedRefresh<T>> {
        self.strategies.retain(|key, _| {
            let alive = store.get(key).is_some();
            if !alive {
                debug!(key = %key, "Dropping revalidation for evicted key");
            }
            alive
        });

        let mut planned = Vec::new();
        for (key, strategy) in &self.strategies {
            let Some(entry) = store.get(key) else {
                continue;
            };
            if entry.age_at(now) <= strategy.interval || !strategy.condition_holds() {
                continue;
            }
            let options = CacheOptions {
                ttl: Some(entry.ttl()),
                tags: entry.tags.clone(),
                ..CacheOptions::default()
            };
            if let Some(marker) = store.try_acquire(key) {
                planned.push(PlannedRefresh {
                    key: key.clone(),
                    marker,
                    delay: strategy.priority.delay(),
                    fetcher: Arc::clone(&strategy.fetcher),
                    options,
                });
            }
        }
        planned
    }
}
