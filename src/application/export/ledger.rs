use std::sync::Arc;

use crate::cache::{CacheKey, SnapshotCache};

/// Remembers which job ids were handed out by this service and the artifact
/// each one renders into. Lives in its own cache namespace so catalog
/// invalidation never touches it. Entries do not expire with the snapshot
/// ttl: a finished job stays downloadable until the cache itself is flushed.
#[derive(Clone)]
pub struct ExportLedger {
    cache: Arc<SnapshotCache>,
}

impl ExportLedger {
    pub fn new(cache: Arc<SnapshotCache>) -> Self {
        Self { cache }
    }

    pub async fn record(&self, job_id: &str, artifact: &str) {
        self.cache
            .set_persistent(&CacheKey::export_job(job_id), artifact.to_string())
            .await;
    }

    /// Artifact name for a job this service submitted, if any.
    pub async fn lookup(&self, job_id: &str) -> Option<String> {
        self.cache.get(&CacheKey::export_job(job_id)).await
    }
}
