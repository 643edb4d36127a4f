//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and tag support.

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

/// Fraction of the original TTL below which an entry counts as approaching expiry.
pub const STALE_WINDOW_RATIO: f64 = 0.2;

/// Longest lifetime an entry can have; longer TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// == Cache Entry ==
/// Represents a single cache entry with its value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// Cache key this entry is stored under
    pub key: String,
    /// The cached value, opaque to the cache
    pub data: T,
    /// Instant the entry was written
    pub timestamp: Instant,
    /// Instant after which the entry is hard-expired (`timestamp + ttl`)
    pub expires_at: Instant,
    /// Labels used for grouped invalidation
    pub tags: BTreeSet<String>,
    /// Write counter for this key, bumped on every overwrite
    pub version: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry written at `now`.
    ///
    /// # Arguments
    /// * `key` - The key the entry belongs to
    /// * `data` - The value to store
    /// * `ttl` - Lifetime of the entry, clamped to `MAX_TTL`
    /// * `tags` - Tags the entry is indexed under
    /// * `version` - Version number for this write
    pub fn new(
        key: String,
        data: T,
        ttl: Duration,
        tags: BTreeSet<String>,
        version: u64,
        now: Instant,
    ) -> Self {
        let ttl = ttl.min(MAX_TTL);
        let expires_at = now.checked_add(ttl).unwrap_or(now);
        Self {
            key,
            data,
            timestamp: now,
            expires_at,
            tags,
            version,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now >= expires_at`, so
    /// a value is served only while strictly inside its lifetime.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Original time-to-live of the entry.
    pub fn ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(self.timestamp)
    }

    /// Age of the entry at `now`.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.timestamp)
    }

    // == Time To Live ==
    /// Remaining lifetime at `now`, `Duration::ZERO` once expired.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }

    // == Approaching Expiry ==
    /// Returns true while the entry is still valid but has less than
    /// 20% of its original TTL left.
    pub fn is_approaching_expiry(&self, now: Instant) -> bool {
        if self.is_expired_at(now) {
            return false;
        }
        let window = self.ttl().mul_f64(STALE_WINDOW_RATIO);
        self.remaining_at(now) < window
    }
}
