//! Cache backend trait definition

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheError;

/// Cache backend trait
///
/// Defines the interface for cache implementations.
/// Both in-memory and Redis backends implement this trait.
///
/// Besides plain keys, backends store hashes whose fields carry their own
/// expiry. A field that has expired is invisible to every hash operation.
///
/// # Consistency Notes
///
/// Operations on individual keys and fields are atomic. The conditional
/// hash writes (`hset_nx`, `hset_xx`) are the only compare-and-set
/// primitives offered.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Set a value in the cache with optional TTL
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>)
    -> Result<(), CacheError>;

    /// Delete a key from the cache
    ///
    /// Returns `true` if the key existed before deletion.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Check if a key exists in the cache
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Atomic increment with TTL (creates key if not exists)
    ///
    /// The TTL is applied only when the counter is created.
    async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, CacheError>;

    /// Get the TTL remaining for a key
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;

    /// Read one field of a hash
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// Set a hash field only if it is absent, then expire it after `ttl`
    ///
    /// Returns `true` if the field was written.
    async fn hset_nx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    /// Overwrite a hash field only if it exists, resetting its expiry to `ttl`
    ///
    /// Returns `true` if the field was written.
    async fn hset_xx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError>;

    /// Set the expiry of an existing hash field
    ///
    /// Returns `false` if the field does not exist.
    async fn hexpire(&self, key: &str, field: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Delete hash fields, returning how many existed
    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, CacheError>;

    /// Read all live fields of a hash
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;

    /// Health check (validates connection)
    async fn health_check(&self) -> Result<(), CacheError>;

    /// Backend name for debugging/logging
    fn backend_name(&self) -> &'static str;
}
