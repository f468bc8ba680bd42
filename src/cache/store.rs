//! Process-wide snapshot cache handle.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::CacheError;
use super::config::{CacheBackend, CacheConfig};
use super::keys::{CacheKey, KeyPrefix, ResourcePath};
use super::lock::{rw_read, rw_write};
use super::memory::MemoryStore;
use super::redis_store::RedisStore;

const TARGET: &str = "cache::store";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

enum CacheProvider {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl CacheProvider {
    fn name(&self) -> &'static str {
        match self {
            CacheProvider::Redis(_) => "redis",
            CacheProvider::Memory(_) => "memory",
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            CacheProvider::Redis(store) => store.get(key).await,
            CacheProvider::Memory(store) => Ok(store.get(key)),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        match self {
            CacheProvider::Redis(store) => store.set(key, &value, ttl).await,
            CacheProvider::Memory(store) => {
                store.set(key, value, ttl);
                Ok(())
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        match self {
            CacheProvider::Redis(store) => store.delete(key).await,
            CacheProvider::Memory(store) => Ok(store.delete(key)),
        }
    }

    async fn delete_prefix(&self, prefix: &KeyPrefix) -> Result<usize, CacheError> {
        match self {
            CacheProvider::Redis(store) => store.delete_prefix(prefix).await,
            CacheProvider::Memory(store) => Ok(store.delete_prefix(prefix)),
        }
    }
}

/// Best-effort key/value store for serialized snapshots.
///
/// Every call is bounded by the configured timeout. Failures are logged and
/// reported as a miss (reads) or silently dropped (writes); callers always
/// fall back to the database.
pub struct SnapshotCache {
    provider: RwLock<Option<Arc<CacheProvider>>>,
    timeout: Duration,
    ttl: Option<Duration>,
}

impl SnapshotCache {
    /// Connect the configured backend. An unreachable Redis degrades to a
    /// cache that always misses.
    pub async fn start(config: &CacheConfig) -> Self {
        let provider = match config.backend {
            CacheBackend::Memory => Some(CacheProvider::Memory(MemoryStore::new())),
            CacheBackend::Disabled => None,
            CacheBackend::Redis => match config.redis_url.as_deref() {
                Some(url) => connect_redis(url).await.map(CacheProvider::Redis),
                None => {
                    warn!(
                        target = TARGET,
                        "redis backend selected without a url; caching disabled"
                    );
                    None
                }
            },
        };

        info!(
            target = TARGET,
            configured = config.backend.as_str(),
            active = provider.as_ref().map(CacheProvider::name).unwrap_or("none"),
            timeout_ms = config.timeout.as_millis() as u64,
            "snapshot cache started"
        );

        Self::with_provider(provider, config)
    }

    /// In-process cache, independent of any configuration file.
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::with_provider(Some(CacheProvider::Memory(MemoryStore::new())), config)
    }

    fn with_provider(provider: Option<CacheProvider>, config: &CacheConfig) -> Self {
        Self {
            provider: RwLock::new(provider.map(Arc::new)),
            timeout: config.timeout,
            ttl: config.ttl,
        }
    }

    /// Detach the backing store. Later calls miss without touching it.
    pub fn stop(&self) {
        let previous = rw_write(&self.provider, TARGET, "stop").take();
        if let Some(provider) = previous {
            info!(target = TARGET, backend = provider.name(), "snapshot cache stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        rw_read(&self.provider, TARGET, "is_running").is_some()
    }

    fn provider(&self) -> Option<Arc<CacheProvider>> {
        rw_read(&self.provider, TARGET, "provider").clone()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let value = match self.provider() {
            Some(provider) => self
                .bounded("get", provider.get(key.as_str()))
                .await
                .flatten(),
            None => None,
        };

        if value.is_some() {
            counter!("carte_cache_hit_total").increment(1);
        } else {
            counter!("carte_cache_miss_total").increment(1);
        }
        value
    }

    pub async fn set(&self, key: &CacheKey, value: String) {
        if let Some(provider) = self.provider() {
            self.bounded("set", provider.set(key.as_str(), value, self.ttl))
                .await;
        }
    }

    /// Like [`set`](Self::set) but ignores the configured snapshot ttl.
    pub async fn set_persistent(&self, key: &CacheKey, value: String) {
        if let Some(provider) = self.provider() {
            self.bounded("set_persistent", provider.set(key.as_str(), value, None))
                .await;
        }
    }

    pub async fn delete(&self, key: &CacheKey) {
        if let Some(provider) = self.provider() {
            self.bounded("delete", provider.delete(key.as_str())).await;
        }
    }

    pub async fn delete_prefix(&self, prefix: &KeyPrefix) {
        if let Some(provider) = self.provider() {
            if let Some(removed) = self
                .bounded("delete_prefix", provider.delete_prefix(prefix))
                .await
            {
                debug!(
                    target = TARGET,
                    prefix = prefix.as_str(),
                    removed,
                    "cache prefix invalidated"
                );
            }
        }
    }

    /// Drop the snapshot at `path` and everything nested below it.
    pub async fn invalidate_subtree(&self, path: &ResourcePath) {
        self.delete(&CacheKey::snapshot(path)).await;
        self.delete_prefix(&KeyPrefix::subtree(path)).await;
    }

    async fn bounded<T, F>(&self, op: &'static str, operation: F) -> Option<T>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let error = match timeout(self.timeout, operation).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(err)) => err,
            Err(_) => CacheError::Timeout(self.timeout),
        };

        counter!("carte_cache_error_total", "op" => op).increment(1);
        warn!(
            target = TARGET,
            op,
            error = %error,
            "cache operation failed; falling back to the database"
        );
        None
    }
}

async fn connect_redis(url: &str) -> Option<RedisStore> {
    match timeout(CONNECT_TIMEOUT, RedisStore::connect(url)).await {
        Ok(Ok(store)) => Some(store),
        Ok(Err(err)) => {
            warn!(target = TARGET, error = %err, "redis unavailable; caching disabled");
            None
        }
        Err(_) => {
            warn!(
                target = TARGET,
                timeout_ms = CONNECT_TIMEOUT.as_millis() as u64,
                "redis connection timed out; caching disabled"
            );
            None
        }
    }
}
