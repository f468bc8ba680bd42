use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::cache::{CacheKey, ResourcePath, SnapshotCache};

const TARGET: &str = "carte::application::catalog::snapshots";

/// Cached snapshot at `path`. An entry that no longer decodes is dropped and
/// reported as a miss.
pub(super) async fn load<T: DeserializeOwned>(
    cache: &SnapshotCache,
    path: &ResourcePath,
) -> Option<T> {
    let key = CacheKey::snapshot(path);
    let raw = cache.get(&key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(target = TARGET, key = key.as_str(), error = %err, "discarding undecodable snapshot");
            cache.delete(&key).await;
            None
        }
    }
}

pub(super) async fn store<T: Serialize>(cache: &SnapshotCache, path: &ResourcePath, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => cache.set(&CacheKey::snapshot(path), raw).await,
        Err(err) => {
            warn!(target = TARGET, path = path.as_str(), error = %err, "snapshot not cached");
        }
    }
}

/// Drop the current entry and write the fresh snapshot in its place.
pub(super) async fn replace<T: Serialize>(
    cache: &SnapshotCache,
    path: &ResourcePath,
    value: &T,
) {
    cache.delete(&CacheKey::snapshot(path)).await;
    store(cache, path, value).await;
}
