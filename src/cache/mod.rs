//! Carte snapshot cache.
//!
//! Serialized entity snapshots keyed by resource path, plus the export job
//! ledger in its own namespace. Supports get, set and prefix delete so that a
//! whole menu subtree can be dropped in one call.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"            # redis | memory | disabled
//! redis_url = "redis://127.0.0.1:6379"
//! timeout_ms = 250
//! # ttl_seconds = 3600
//! ```

mod config;
mod keys;
mod lock;
mod memory;
mod redis_store;
mod store;

use std::time::Duration;

use thiserror::Error;

pub use config::{CacheBackend, CacheConfig};
pub use keys::{API_PREFIX, CacheKey, KeyPrefix, Namespace, ResourcePath};
pub use store::SnapshotCache;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}
