//! In-memory cache implementation using moka + dashmap
//!
//! Uses moka for plain keys with per-entry TTL, and dashmap for atomic
//! counters (rate limiting) and hashes with per-field expiry (session
//! whitelist).

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use moka::Expiry;
use moka::future::Cache;

use super::backend::CacheBackend;
use super::error::CacheError;
use crate::core::config::{CacheConfig, EvictionPolicy};

/// Cache entry with data and metadata
#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    ttl: Option<Duration>,
    created_at: Instant,
}

/// Per-entry expiry tracking for variable TTLs
struct VariableTtlExpiry;

impl Expiry<String, CacheEntry> for VariableTtlExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_read(
        &self,
        _key: &String,
        _value: &CacheEntry,
        _read_at: Instant,
        duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        duration_until_expiry
    }
}

/// Counter entry for rate limiting
struct CounterEntry {
    count: AtomicI64,
    expires_at: Instant,
}

/// Deadline `ttl` from `now`; `None` (never) when the sum leaves `Instant`'s range
fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

/// Counters saturate to a ten-year window instead of overflowing
const COUNTER_HORIZON: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// One field of an in-memory hash
struct HashField {
    value: String,
    expires_at: Option<Instant>,
}

impl HashField {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

/// In-memory cache implementation
///
/// Uses:
/// - `moka::Cache` - General cache with TinyLFU eviction, automatic cleanup
/// - `DashMap<CounterEntry>` - Atomic counters for rate limiting
/// - `DashMap<HashMap<HashField>>` - Hashes; expired fields are dropped on write
///   and by a periodic sweep
pub struct InMemoryCache {
    cache: Cache<String, CacheEntry>,
    counters: DashMap<String, CounterEntry>,
    hashes: DashMap<String, HashMap<String, HashField>>,
    /// Counter for cleanup scheduling (increments on every incr operation)
    cleanup_ops: AtomicU64,
    /// Same for hash writes
    hash_ops: AtomicU64,
}

impl InMemoryCache {
    /// Create a new in-memory cache with the given configuration
    ///
    /// Note: moka uses TinyLFU eviction regardless of the eviction_policy setting.
    pub fn new(config: &CacheConfig) -> Self {
        let builder = Cache::builder()
            .max_capacity(config.max_entries)
            .initial_capacity((config.max_entries as usize / 4).min(10_000));

        if config.eviction_policy == EvictionPolicy::Lru {
            tracing::debug!(
                "LRU eviction policy selected but moka uses TinyLFU internally. \
                 TinyLFU provides similar recency-based eviction with better hit rates."
            );
        }

        let cache = builder.expire_after(VariableTtlExpiry).build();

        Self {
            cache,
            counters: DashMap::new(),
            hashes: DashMap::new(),
            cleanup_ops: AtomicU64::new(0),
            hash_ops: AtomicU64::new(0),
        }
    }

    /// Clean up expired counters (called periodically)
    fn cleanup_expired_counters(&self) {
        let now = Instant::now();
        self.counters.retain(|_, entry| now < entry.expires_at);
    }

    /// Drop expired hash fields, then hashes left empty
    fn cleanup_expired_hashes(&self) {
        let now = Instant::now();
        self.hashes.retain(|_, hash| {
            hash.retain(|_, f| f.is_live(now));
            !hash.is_empty()
        });
    }

    /// Sweep hashes every 256 writes; keys never touched again would leak otherwise
    fn maybe_sweep_hashes(&self) {
        let ops = self.hash_ops.fetch_add(1, Ordering::Relaxed);
        if ops.is_multiple_of(256) {
            self.cleanup_expired_hashes();
        }
    }

    /// Write a hash field when `condition(existing)` holds
    fn hset_if(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
        condition: impl FnOnce(bool) -> bool,
    ) -> bool {
        self.maybe_sweep_hashes();

        let now = Instant::now();
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        hash.retain(|_, f| f.is_live(now));

        let exists = hash.contains_key(field);
        if !condition(exists) {
            let empty = hash.is_empty();
            drop(hash);
            if empty {
                self.hashes.remove_if(key, |_, h| h.is_empty());
            }
            return false;
        }

        hash.insert(
            field.to_string(),
            HashField {
                value: value.to_string(),
                expires_at: deadline(now, ttl),
            },
        );
        true
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.cache.get(key).await.map(|entry| entry.data.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data: value,
            ttl,
            created_at: Instant::now(),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        // Clear every keyspace; a key may live in more than one
        let in_cache = self.cache.contains_key(key);
        let in_counters = self.counters.remove(key).is_some();
        let in_hashes = self.hashes.remove(key).is_some();
        self.cache.invalidate(key).await;
        Ok(in_cache || in_counters || in_hashes)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.cache.contains_key(key))
    }

    async fn incr(&self, key: &str, ttl: Option<Duration>) -> Result<i64, CacheError> {
        let now = Instant::now();
        let window = ttl.unwrap_or(Duration::from_secs(60)).min(COUNTER_HORIZON);
        let expires_at = now + window;

        let count = match self.counters.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let counter = occupied.get_mut();
                if now >= counter.expires_at {
                    counter.count.store(1, Ordering::SeqCst);
                    counter.expires_at = expires_at;
                    1
                } else {
                    counter.count.fetch_add(1, Ordering::SeqCst) + 1
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CounterEntry {
                    count: AtomicI64::new(1),
                    expires_at,
                });
                1
            }
        };

        // Cleanup every 256 operations regardless of map size
        let ops = self.cleanup_ops.fetch_add(1, Ordering::Relaxed);
        if ops.is_multiple_of(256) {
            self.cleanup_expired_counters();
        }

        Ok(count)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        if let Some(entry) = self.counters.get(key) {
            let remaining = entry.expires_at.saturating_duration_since(Instant::now());
            if remaining > Duration::ZERO {
                return Ok(Some(remaining));
            }
            return Ok(None);
        }

        if let Some(entry) = self.cache.get(key).await
            && let Some(ttl) = entry.ttl
            && let Some(remaining) = ttl.checked_sub(entry.created_at.elapsed())
            && remaining > Duration::ZERO
        {
            return Ok(Some(remaining));
        }

        Ok(None)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        Ok(self.hashes.get(key).and_then(|hash| {
            hash.get(field)
                .filter(|f| f.is_live(now))
                .map(|f| f.value.clone())
        }))
    }

    async fn hset_nx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        Ok(self.hset_if(key, field, value, ttl, |exists| !exists))
    }

    async fn hset_xx(
        &self,
        key: &str,
        field: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        Ok(self.hset_if(key, field, value, ttl, |exists| exists))
    }

    async fn hexpire(&self, key: &str, field: &str, ttl: Duration) -> Result<bool, CacheError> {
        let now = Instant::now();
        let Some(mut hash) = self.hashes.get_mut(key) else {
            return Ok(false);
        };
        match hash.get_mut(field) {
            Some(f) if f.is_live(now) => {
                f.expires_at = deadline(now, ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> Result<u64, CacheError> {
        let now = Instant::now();
        let removed = match self.hashes.get_mut(key) {
            Some(mut hash) => fields
                .iter()
                .filter_map(|field| hash.remove(field))
                .filter(|f| f.is_live(now))
                .count() as u64,
            None => 0,
        };
        self.hashes.remove_if(key, |_, h| h.is_empty());
        Ok(removed)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        let now = Instant::now();
        Ok(self
            .hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .filter(|(_, f)| f.is_live(now))
                    .map(|(name, f)| (name.clone(), f.value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
