//! Admin Handlers
//!
//! One async fn per admin endpoint, all over a JSON-valued `AppCache`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::info;

use crate::cache::{AppCache, StatsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::requests::validate_key;
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, InvalidateTagsRequest,
    InvalidateTagsResponse, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// `AppCache` is internally synchronized; cloning shares the same cache.
#[derive(Clone)]
pub struct AppState {
    pub cache: AppCache<Value>,
}

impl AppState {
    /// Wraps an existing cache; clones of the state share it.
    pub fn new(cache: AppCache<Value>) -> Self {
        Self { cache }
    }

    /// The cache's background tasks are not started here.
    pub fn from_config(config: &Config) -> Self {
        Self::new(AppCache::from_config(config))
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value with the options built from the request.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let options = req.options();
    let response = SetResponse::stored(&req.key, &options);
    state.cache.set(&req.key, req.value, options).await;

    Ok(Json(response))
}

/// Handler for GET /get/:key
///
/// Returns the cached value only while it is valid; never fetches.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .peek(&key)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key; 404 when nothing was cached under it.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    if !state.cache.invalidate(&key).await {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::invalidated(key)))
}

/// Handler for POST /invalidate
///
/// Invalidates every entry carrying any of the requested tags.
pub async fn invalidate_tags_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateTagsRequest>,
) -> Result<Json<InvalidateTagsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let removed = state.cache.invalidate_by_tags(&req.tags).await;
    info!("Invalidated {} entries for tags {:?}", removed, req.tags);

    Ok(Json(InvalidateTagsResponse {
        tags: req.tags,
        removed,
    }))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear().await;
    Json(ClearResponse::cleared())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.cache.stats().await)
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.is_running()))
}
