//! Request DTOs for the admin API
//!
//! Bodies accepted by `PUT /set` and `POST /invalidate`, plus their checks.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::cache::{CacheOptions, CachePreset, MAX_KEY_LENGTH, MAX_TTL, MAX_VALUE_SIZE};

/// Body of `PUT /set`
///
/// `preset` (`products`, `categories`, ...) is applied first; an explicit
/// `ttl` overrides it and `tags` are added to the preset's tag.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    /// Seconds; absent means the preset's TTL or the cache default
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Extra tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preset: Option<String>,
}

impl SetRequest {
    /// Returns the first problem found, if any.
    pub fn validate(&self) -> Option<String> {
        if let Some(error) = validate_key(&self.key) {
            return Some(error);
        }
        match self.ttl {
            Some(0) => return Some("TTL must be greater than zero".to_string()),
            Some(ttl) if ttl > MAX_TTL.as_secs() => {
                return Some(format!(
                    "TTL exceeds maximum of {} seconds",
                    MAX_TTL.as_secs()
                ));
            }
            _ => {}
        }
        if self.tags.iter().any(String::is_empty) {
            return Some("Tags cannot be empty".to_string());
        }
        if let Some(name) = &self.preset {
            if CachePreset::by_name(name).is_none() {
                return Some(format!("Unknown preset '{}'", name));
            }
        }
        let size = serde_json::to_vec(&self.value).map_or(0, |bytes| bytes.len());
        if size > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }

    /// Builds cache options: preset first, then explicit TTL and tags.
    pub fn options(&self) -> CacheOptions {
        let mut options = self
            .preset
            .as_deref()
            .and_then(CachePreset::by_name)
            .map(|preset| preset.options())
            .unwrap_or_default();
        if let Some(ttl) = self.ttl {
            options.ttl = Some(Duration::from_secs(ttl));
        }
        options.tags.extend(self.tags.iter().cloned());
        options
    }
}

/// Request body for tag invalidation (POST /invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateTagsRequest {
    pub tags: Vec<String>,
}

impl InvalidateTagsRequest {
    pub fn validate(&self) -> Option<String> {
        if self.tags.is_empty() {
            return Some("At least one tag is required".to_string());
        }
        None
    }
}

/// Shared key check for body and path parameters.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LENGTH
        ));
    }
    None
}
