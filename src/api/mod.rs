//! API Module
//!
//! Admin HTTP handlers and routing over the application cache.
//!
//! # Endpoints
//! - `PUT /set` - Store a JSON value with optional TTL, tags or preset
//! - `GET /get/:key` - Read a valid cached value without fetching
//! - `DELETE /del/:key` - Invalidate a key
//! - `POST /invalidate` - Invalidate every entry carrying any of the given tags
//! - `DELETE /clear` - Empty the cache
//! - `GET /stats` - Cache statistics snapshot
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
