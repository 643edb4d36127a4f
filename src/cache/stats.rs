//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction counters and builds point-in-time snapshots.

use serde::Serialize;

// == Cache Stats ==
/// Running counters kept alongside the entry store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads served from a valid entry
    pub hits: u64,
    /// Reads that had to call the fetcher
    pub misses: u64,
    /// Entries removed by garbage collection
    pub evictions: u64,
    /// Background refreshes that wrote a new value
    pub revalidations: u64,
    /// Background refreshes whose fetcher failed
    pub revalidation_failures: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_revalidation(&mut self) {
        self.revalidations += 1;
    }

    pub fn record_revalidation_failure(&mut self) {
        self.revalidation_failures += 1;
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the cache returned by `AppCache::stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    /// Entries carrying at least one tag
    pub tagged_entries: usize,
    /// Distinct tags in the tag index
    pub tag_count: usize,
    /// Keys with a revalidation strategy
    pub scheduled_revalidations: usize,
    /// Refreshes currently holding an in-flight marker
    pub active_revalidations: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub revalidations: u64,
    pub revalidation_failures: u64,
    pub hit_rate: f64,
    /// Rough footprint of keys, tags and entry headers; not an exact accounting
    pub memory_estimate_bytes: usize,
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.revalidations, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_evictions() {
        let mut stats = CacheStats::new();
        stats.record_evictions(3);
        stats.record_evictions(2);
        assert_eq!(stats.evictions, 5);
    }

    #[test]
    fn test_snapshot_serialize() {
        let snapshot = StatsSnapshot {
            total_entries: 2,
            hit_rate: 0.5,
            ..StatsSnapshot::default()
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"total_entries\":2"));
        assert!(json.contains("memory_estimate_bytes"));
    }
}
