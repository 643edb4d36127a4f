//! Per-call cache options.

use std::collections::BTreeSet;
use std::time::Duration;

/// Default entry lifetime when neither the call nor the config sets one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

// == Cache Options ==
/// Options accepted by `get` and `set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Entry lifetime; `None` falls back to the cache's default TTL
    pub ttl: Option<Duration>,
    /// Tags the entry is indexed under
    pub tags: BTreeSet<String>,
    /// Refresh in the background when a read lands in the last 20% of the TTL
    pub revalidate_on_stale: bool,
    /// Informational marker for callers that fetch off the request path
    pub background: bool,
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn revalidate_on_stale(mut self, enabled: bool) -> Self {
        self.revalidate_on_stale = enabled;
        self
    }

    pub fn background(mut self, enabled: bool) -> Self {
        self.background = enabled;
        self
    }

    /// Resolves the effective TTL against the cache default.
    pub fn ttl_or(&self, default_ttl: Duration) -> Duration {
        self.ttl.unwrap_or(default_ttl)
    }
}
