//! Garbage Collector
//!
//! Evicts expired entries, then the oldest ones while the store is over `max_size`.

use tokio::time::Instant;

use crate::cache::CacheStore;

// == Collect ==
/// Runs one GC pass over `store` at `now`.
///
/// Pass 1 collects every expired key. Pass 2 runs only if the store would
/// still be over `max_size` and adds the oldest remaining entries (ascending
/// `timestamp`, ties broken by write order) until it would fit. Victims go
/// through `CacheStore::evict`, keeping the tag index consistent. In-flight
/// markers survive, so a refresh running for an evicted key still stores
/// its result.
///
/// Returns the number of entries removed.
pub fn collect<T>(store: &mut CacheStore<T>, now: Instant) -> usize {
    let mut victims: Vec<String> = store
        .entries()
        .filter(|entry| entry.is_expired_at(now))
        .map(|entry| entry.key.clone())
        .collect();

    let remaining = store.len() - victims.len();
    if remaining > store.max_size() {
        let overflow = remaining - store.max_size();
        let mut live: Vec<_> = store
            .entries()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| (entry.timestamp, entry.version, entry.key.clone()))
            .collect();
        live.sort_unstable();
        victims.extend(live.into_iter().take(overflow).map(|(_, _, key)| key));
    }

    let removed = victims.iter().filter(|key| store.evict(key)).count();
    store.stats_mut().record_evictions(removed);
    removed
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheOptions;
    use std::time::Duration;

    fn options(ttl_ms: u64, tag: &str) -> CacheOptions {
        CacheOptions::new()
            .with_ttl(Duration::from_millis(ttl_ms))
            .with_tags([tag])
    }

    #[test]
    fn test_collect_removes_only_expired() {
        let mut store: CacheStore<u32> = CacheStore::new(100, 0.8, Duration::from_secs(300));
        let now = Instant::now();
        store.insert("short", 1, &options(10, "a"), now);
        store.insert("long", 2, &options(10_000, "a"), now);

        let removed = collect(&mut store, now + Duration::from_millis(10));

        assert_eq!(removed, 1);
        assert!(store.get("short").is_none());
        assert!(store.get("long").is_some());
        assert!(store.is_consistent());
    }

    #[test]
    fn test_collect_evicts_oldest_over_capacity() {
        let mut store: CacheStore<u32> = CacheStore::new(3, 1.0, Duration::from_secs(300));
        let start = Instant::now();
        for i in 0..6u64 {
            let at = start + Duration::from_millis(i);
            store.insert(&format!("k{i}"), i as u32, &options(60_000, "all"), at);
        }

        let removed = collect(&mut store, start + Duration::from_millis(10));

        assert_eq!(removed, 3);
        assert_eq!(store.len(), 3);
        for key in ["k0", "k1", "k2"] {
            assert!(store.get(key).is_none(), "{key} should be evicted");
        }
        for key in ["k3", "k4", "k5"] {
            assert!(store.get(key).is_some(), "{key} should survive");
        }
        assert!(store.is_consistent());
    }

    #[test]
    fn test_collect_counts_expired_towards_capacity() {
        let mut store: CacheStore<u32> = CacheStore::new(2, 1.0, Duration::from_secs(300));
        let now = Instant::now();
        store.insert("e1", 1, &options(5, "x"), now);
        store.insert("e2", 2, &options(5, "x"), now);
        store.insert("live1", 3, &options(60_000, "x"), now);
        store.insert("live2", 4, &options(60_000, "x"), now);

        let removed = collect(&mut store, now + Duration::from_millis(5));

        // Expired entries alone bring the store back to max_size
        assert_eq!(removed, 2);
        assert!(store.get("live1").is_some());
        assert!(store.get("live2").is_some());
    }

    #[test]
    fn test_equal_timestamps_evict_in_write_order() {
        let mut store: CacheStore<u32> = CacheStore::new(1, 1.0, Duration::from_secs(300));
        let now = Instant::now();
        store.insert("z", 1, &CacheOptions::new(), now);
        store.insert("a", 2, &CacheOptions::new(), now);

        collect(&mut store, now);

        assert!(store.get("z").is_none());
        assert!(store.get("a").is_some());
    }

    #[test]
    fn test_collect_keeps_in_flight_marker() {
        let mut store: CacheStore<u32> = CacheStore::new(100, 0.8, Duration::from_secs(300));
        let now = Instant::now();
        store.insert("p:1", 1, &options(5, "products"), now);
        let marker = store.try_acquire("p:1").unwrap();

        assert_eq!(collect(&mut store, now + Duration::from_millis(5)), 1);

        assert!(store.get("p:1").is_none());
        assert!(store.is_in_flight("p:1"));
        assert!(store.release("p:1", marker));
        assert!(store.is_consistent());
    }

    #[test]
    fn test_collect_records_evictions() {
        let mut store: CacheStore<u32> = CacheStore::new(100, 0.8, Duration::from_secs(300));
        let now = Instant::now();
        store.insert("k", 1, &options(1, "t"), now);

        collect(&mut store, now + Duration::from_millis(1));

        assert_eq!(store.snapshot(now, 0).evictions, 1);
    }
}
