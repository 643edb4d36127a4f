//! Cache Module
//!
//! In-process, tag-indexed TTL cache with stale-while-revalidate reads,
//! scheduled background refresh and size-bounded garbage collection.

mod app_cache;
mod entry;
pub mod gc;
mod options;
mod presets;
mod scheduler;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use app_cache::{AppCache, WeakAppCache};
pub use entry::{CacheEntry, MAX_TTL, STALE_WINDOW_RATIO};
pub use options::{CacheOptions, DEFAULT_TTL};
pub use presets::CachePreset;
pub use scheduler::{
    BoxFuture, Condition, Fetcher, PlannedRefresh, Priority, RevalidationScheduler,
    RevalidationStrategy,
};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
pub use tags::TagIndex;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized value size in bytes for the admin API
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
