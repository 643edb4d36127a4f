//! Storefront Cache - in-process application cache for the storefront
//!
//! Tag-indexed TTL cache with stale-while-revalidate reads, scheduled
//! background refresh and size-bounded garbage collection, plus a small
//! admin HTTP API over it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{AppCache, CacheOptions, CachePreset, Priority, RevalidationStrategy};
pub use config::Config;
pub use error::{CacheError, Result};
