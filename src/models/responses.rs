//! Response DTOs for the admin API
//!
//! Outgoing JSON bodies. `/stats` serializes `StatsSnapshot` as-is, so it
//! has no wrapper here.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheOptions;

/// Body of `GET /get/:key`: a value that is still within its TTL
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Body of `PUT /set`, echoing the options the entry was stored with
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    pub message: String,
    pub key: String,
    /// Explicit TTL in seconds; `None` means the cache default applied
    pub ttl: Option<u64>,
    pub tags: Vec<String>,
}

impl SetResponse {
    pub fn stored(key: impl Into<String>, options: &CacheOptions) -> Self {
        let key = key.into();
        Self {
            message: format!("Stored '{}'", key),
            ttl: options.ttl.map(|ttl| ttl.as_secs()),
            tags: options.tags.iter().cloned().collect(),
            key,
        }
    }
}

/// Body of `DELETE /del/:key`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn invalidated(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Invalidated '{}'", key),
            key,
        }
    }
}

/// Body of `POST /invalidate`
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateTagsResponse {
    pub tags: Vec<String>,
    /// Entries dropped across all requested tags
    pub removed: usize,
}

/// Body of `DELETE /clear`
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn cleared() -> Self {
        Self {
            message: "Cache cleared".to_string(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// GC and revalidation ticks are running
    pub background_tasks: bool,
    /// RFC 3339, UTC
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(background_tasks: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            background_tasks,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
