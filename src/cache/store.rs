//! Cache Store Module
//!
//! Entry store, tag index and in-flight markers kept in lockstep.
//!
//! Every method here is synchronous; the facade calls them while holding a
//! single write lock, so a `set` or `remove` is never observed half-applied.

use std::collections::HashMap;
use std::mem;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::cache::{gc, CacheEntry, CacheOptions, CacheStats, StatsSnapshot, TagIndex};

// == In-Flight Marker ==
/// Marks a key as being refreshed. Dropping `done` wakes every waiter.
#[derive(Debug)]
struct InFlight {
    id: u64,
    done: watch::Sender<()>,
}

// == Cache Store ==
/// Canonical key → entry mapping plus its secondary structures.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Tag → keys index
    tags: TagIndex,
    /// Keys with a refresh in progress
    in_flight: HashMap<String, InFlight>,
    /// Performance statistics
    stats: CacheStats,
    /// Entry count GC trims down to
    max_size: usize,
    /// Fraction of `max_size` at which `set` runs GC synchronously
    gc_threshold: f64,
    /// TTL for writes whose options carry none
    default_ttl: Duration,
    /// Store-wide write counter used as entry version
    next_version: u64,
    next_marker: u64,
}

impl<T> CacheStore<T> {
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `max_size` - Entry count GC trims the store down to
    /// * `gc_threshold` - Fraction of `max_size` that triggers GC on `set`
    /// * `default_ttl` - TTL for entries written without one
    pub fn new(max_size: usize, gc_threshold: f64, default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            tags: TagIndex::new(),
            in_flight: HashMap::new(),
            stats: CacheStats::new(),
            max_size,
            gc_threshold,
            default_ttl,
            next_version: 0,
            next_marker: 0,
        }
    }

    // == Set ==
    /// Writes an entry, reindexes its tags and runs GC if the store grew past
    /// `max_size * gc_threshold`.
    ///
    /// Returns the number of entries garbage collected.
    pub fn set(&mut self, key: &str, data: T, options: &CacheOptions, now: Instant) -> usize {
        self.insert(key, data, options, now);
        if self.needs_gc() {
            gc::collect(self, now)
        } else {
            0
        }
    }

    /// Writes an entry without the GC check.
    pub fn insert(&mut self, key: &str, data: T, options: &CacheOptions, now: Instant) {
        self.next_version += 1;
        let entry = CacheEntry::new(
            key.to_string(),
            data,
            options.ttl_or(self.default_ttl),
            options.tags.clone(),
            self.next_version,
            now,
        );

        // Old tag associations go first so a retagged key leaves no orphans
        if let Some(previous) = self.entries.get(key) {
            self.tags.remove(key, &previous.tags);
        }
        self.tags.insert(key, &entry.tags);
        self.entries.insert(key.to_string(), entry);
    }

    // == Get ==
    /// Returns the entry for `key`, expired or not.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    // == Remove ==
    /// Removes an entry together with its tag associations and in-flight marker.
    ///
    /// Returns whether an entry existed.
    pub fn remove(&mut self, key: &str) -> bool {
        // Dropping the marker wakes anything waiting on this key
        self.in_flight.remove(key);
        self.evict(key)
    }

    /// Removes an entry and its tag associations, leaving any in-flight
    /// marker in place so the refresh holding it still writes its result.
    pub fn evict(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.tags.remove(key, &entry.tags);
                true
            }
            None => false,
        }
    }

    // == Remove By Tags ==
    /// Removes every entry bucketed under any of `tags`, dropping the buckets.
    ///
    /// Unknown tags are ignored. Returns the number of entries removed.
    pub fn remove_by_tags<I, S>(&mut self, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for tag in tags {
            for key in self.tags.take(tag.as_ref()) {
                if self.remove(&key) {
                    removed += 1;
                }
            }
        }
        removed
    }

    // == Clear ==
    /// Empties entries, tag index and in-flight markers.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tags.clear();
        self.in_flight.clear();
    }

    // == In-Flight Markers ==
    /// Claims the in-flight marker for `key`, returning its id, or `None`
    /// when another refresh already holds it.
    pub fn try_acquire(&mut self, key: &str) -> Option<u64> {
        if self.in_flight.contains_key(key) {
            return None;
        }
        self.next_marker += 1;
        let (done, _) = watch::channel(());
        self.in_flight.insert(
            key.to_string(),
            InFlight {
                id: self.next_marker,
                done,
            },
        );
        Some(self.next_marker)
    }

    /// Releases the marker for `key` if it is still the one identified by `id`.
    ///
    /// Returns false when the marker was revoked (invalidated or cleared) meanwhile.
    pub fn release(&mut self, key: &str, id: u64) -> bool {
        match self.in_flight.get(key) {
            Some(marker) if marker.id == id => {
                self.in_flight.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Subscribes to the release of the marker for `key`, if one is held.
    pub fn subscribe(&self, key: &str) -> Option<watch::Receiver<()>> {
        self.in_flight.get(key).map(|marker| marker.done.subscribe())
    }

    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    // == GC Support ==
    /// Returns true once the store holds more than `max_size * gc_threshold` entries.
    pub fn needs_gc(&self) -> bool {
        self.entries.len() as f64 > self.max_size as f64 * self.gc_threshold
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Iterates over all entries.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<T>> {
        self.entries.values()
    }

    // == Stats ==
    pub fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    /// Builds a snapshot at `now`; `scheduled` comes from the revalidation scheduler.
    pub fn snapshot(&self, now: Instant, scheduled: usize) -> StatsSnapshot {
        let expired_entries = self
            .entries
            .values()
            .filter(|entry| entry.is_expired_at(now))
            .count();
        let tagged_entries = self
            .entries
            .values()
            .filter(|entry| !entry.tags.is_empty())
            .count();

        StatsSnapshot {
            total_entries: self.entries.len(),
            valid_entries: self.entries.len() - expired_entries,
            expired_entries,
            tagged_entries,
            tag_count: self.tags.len(),
            scheduled_revalidations: scheduled,
            active_revalidations: self.in_flight.len(),
            hits: self.stats.hits,
            misses: self.stats.misses,
            evictions: self.stats.evictions,
            revalidations: self.stats.revalidations,
            revalidation_failures: self.stats.revalidation_failures,
            hit_rate: self.stats.hit_rate(),
            memory_estimate_bytes: self.memory_estimate(),
        }
    }

    /// Rough byte estimate: keys, tag strings and fixed entry headers.
    /// Heap data owned by `T` is not followed.
    fn memory_estimate(&self) -> usize {
        let entries: usize = self
            .entries
            .iter()
            .map(|(key, entry)| {
                key.len() * 2
                    + entry.tags.iter().map(String::len).sum::<usize>()
                    + mem::size_of::<CacheEntry<T>>()
            })
            .sum();
        let index: usize = self
            .tags
            .iter()
            .map(|(tag, keys)| tag.len() + keys.iter().map(String::len).sum::<usize>())
            .sum();
        entries + index
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Consistency ==
    /// Checks that entries and tag buckets mirror each other exactly.
    pub fn is_consistent(&self) -> bool {
        let buckets_backed = self.tags.iter().all(|(tag, keys)| {
            !keys.is_empty()
                && keys.iter().all(|key| {
                    self.entries
                        .get(key)
                        .is_some_and(|entry| entry.tags.contains(tag))
                })
        });
        let entries_indexed = self.entries.iter().all(|(key, entry)| {
            entry
                .tags
                .iter()
                .all(|tag| self.tags.keys(tag).is_some_and(|keys| keys.contains(key)))
        });
        buckets_backed && entries_indexed
    }
}
