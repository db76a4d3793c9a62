//! Cache module
//!
//! Provides caching infrastructure with pluggable backends:
//! - In-memory (default) - uses moka + dashmap
//! - Redis - uses deadpool-redis
//!
//! Catalog payloads, the session whitelist and rate-limit counters all live
//! here.

mod backend;
mod error;
mod key;
mod memory;
pub mod rate_limiter;
mod redis;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use backend::CacheBackend;
pub use error::CacheError;
pub use key::{CacheKey, ListKey};
pub use rate_limiter::{RateLimitBucket, RateLimitResult, RateLimiter};

use memory::InMemoryCache;

use crate::core::config::{CacheBackendType, CacheConfig};

/// Cache service providing typed access to cache backend
///
/// Values go through MessagePack; hash fields are plain strings.
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("backend", &self.backend.backend_name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl CacheService {
    /// Create a new cache service from configuration
    pub async fn new(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend: Arc<dyn CacheBackend> = match config.backend {
            CacheBackendType::Memory => {
                tracing::debug!(
                    max_entries = config.max_entries,
                    eviction_policy = ?config.eviction_policy,
                    "Initializing in-memory cache"
                );
                Arc::new(InMemoryCache::new(config))
            }
            CacheBackendType::Redis => {
                let url = config.redis_url.as_ref().ok_or_else(|| {
                    CacheError::Config("redis_url required for Redis backend".into())
                })?;
                Arc::new(redis::RedisCache::new(url).await?)
            }
        };

        Ok(Self {
            backend,
            default_ttl: Duration::from_secs(config.ttl_secs),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// TTL applied to catalog payloads
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // =========================================================================
    // Typed API (MessagePack)
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.backend.get(key).await? {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let bytes = rmp_serde::to_vec(value)?;
        self.backend.set(key, bytes, ttl).await
    }

    // =========================================================================
    // Keys and counters
    // =========================================================================

    pub async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.delete(key).await
    }

    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.backend.exists(key).await
    }

    /// Atomic increment (for rate limiting)
    pub async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, CacheError> {
        self.backend.incr(key, ttl).await
    }

    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        self.backend.ttl(key).await
    }

    // =========================================================================
    // Hashes with per-field expiry
    // =========================================================================

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        self.backend.hget(key, field).await
    }

    pub async fn hset_nx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.backend.hset_nx(key, field, value, ttl).await
    }

    pub async fn hset_xx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.backend.hset_xx(key, field, value, ttl).await
    }

    pub async fn hexpire(&self, key: &str, field: &str, ttl: Duration) -> Result<bool, CacheError> {
        self.backend.hexpire(key, field, ttl).await
    }

    pub async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, CacheError> {
        self.backend.hdel(key, fields).await
    }

    pub async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        self.backend.hgetall(key).await
    }

    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.backend.health_check().await
    }
}
