//! Tag Index Module
//!
//! Secondary mapping from tag to the keys carrying it, used for bulk invalidation.

use std::collections::{BTreeSet, HashMap, HashSet};

// == Tag Index ==
/// Maps each tag to the set of keys currently indexed under it.
///
/// Buckets are created on demand and dropped as soon as they become empty,
/// so every bucket present holds at least one key.
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    // == Constructor ==
    /// Creates a new empty tag index.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Indexes `key` under every tag in `tags`.
    pub fn insert(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            self.buckets
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Remove ==
    /// Removes `key` from every bucket named in `tags`, dropping buckets that empty out.
    pub fn remove(&mut self, key: &str, tags: &BTreeSet<String>) {
        for tag in tags {
            if let Some(bucket) = self.buckets.get_mut(tag) {
                bucket.remove(key);
                if bucket.is_empty() {
                    self.buckets.remove(tag);
                }
            }
        }
    }

    // == Take Bucket ==
    /// Removes the bucket for `tag` and returns its keys (empty if the tag is unknown).
    pub fn take(&mut self, tag: &str) -> HashSet<String> {
        self.buckets.remove(tag).unwrap_or_default()
    }

    /// Keys currently indexed under `tag`.
    pub fn keys(&self, tag: &str) -> Option<&HashSet<String>> {
        self.buckets.get(tag)
    }

    /// Iterates over every `(tag, keys)` bucket.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashSet<String>)> {
        self.buckets.iter()
    }

    /// Number of distinct tags.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
