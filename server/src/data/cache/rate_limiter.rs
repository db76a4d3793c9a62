//! Fixed-window rate limiter on top of the cache counters
//!
//! A window opens with the first request for an identifier and lasts
//! `window_secs`. Each bucket allows `requests_per_window + burst` requests
//! per window. Up to twice the limit can pass around a window boundary.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::CacheService;
use super::key::CacheKey;
use crate::core::constants::DEFAULT_RATE_LIMIT_WINDOW_SECS;

/// Rate limit bucket configuration
#[derive(Debug, Clone)]
pub struct RateLimitBucket {
    /// Bucket name, part of the counter key
    pub name: &'static str,
    pub requests_per_window: u32,
    pub window_secs: u64,
    /// Extra requests tolerated above `requests_per_window`
    pub burst: u32,
}

impl RateLimitBucket {
    /// Catalog and general API traffic (5% burst)
    pub fn api(rpm: u32) -> Self {
        Self {
            name: "api",
            requests_per_window: rpm,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            burst: rpm / 20,
        }
    }

    /// Credential endpoints: signup, login, refresh (33% burst)
    pub fn auth(rpm: u32) -> Self {
        Self {
            name: "auth",
            requests_per_window: rpm,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
            burst: rpm / 3,
        }
    }

    pub fn total_limit(&self) -> u32 {
        self.requests_per_window.saturating_add(self.burst)
    }
}

/// Rate limit check result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    /// Total limit (rpm + burst)
    pub limit: u32,
    /// Unix timestamp when the window resets
    pub reset_at: u64,
    /// Seconds until retry, set only when blocked
    pub retry_after: Option<u64>,
}

pub struct RateLimiter {
    cache: Arc<CacheService>,
}

impl RateLimiter {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self { cache }
    }

    /// Count one request for `identifier` in `bucket`
    ///
    /// Cache failures let the request through.
    pub async fn check(&self, bucket: &RateLimitBucket, identifier: &str) -> RateLimitResult {
        let key = CacheKey::rate_limit(bucket.name, identifier);
        let window = Duration::from_secs(bucket.window_secs);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let count = match self.cache.incr(&key, Some(window)).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(
                    bucket = bucket.name,
                    %identifier,
                    error = %e,
                    "Rate limit counter failed, allowing request"
                );
                1
            }
        };

        let limit = bucket.total_limit();
        let allowed = count <= i64::from(limit);
        let remaining = i64::from(limit)
            .saturating_sub(count)
            .try_into()
            .unwrap_or(0u32);

        let ttl = self.cache.ttl(&key).await.ok().flatten();
        let reset_at = now.saturating_add(ttl.map_or(bucket.window_secs, |d| d.as_secs()));

        tracing::trace!(bucket = bucket.name, %identifier, count, limit, allowed, "Rate limit check");

        RateLimitResult {
            allowed,
            remaining,
            limit,
            reset_at,
            retry_after: (!allowed).then(|| reset_at.saturating_sub(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{CacheBackendType, CacheConfig, EvictionPolicy};

    async fn test_cache() -> Arc<CacheService> {
        let config = CacheConfig {
            backend: CacheBackendType::Memory,
            max_entries: 1000,
            eviction_policy: EvictionPolicy::TinyLfu,
            redis_url: None,
            ttl_secs: 60,
        };
        Arc::new(CacheService::new(&config).await.unwrap())
    }

    fn tight_bucket(burst: u32) -> RateLimitBucket {
        RateLimitBucket {
            name: "test",
            requests_per_window: 5,
            window_secs: 60,
            burst,
        }
    }

    #[tokio::test]
    async fn test_blocks_after_limit() {
        let limiter = RateLimiter::new(test_cache().await);
        let bucket = tight_bucket(0);

        for i in 0..5 {
            assert!(
                limiter.check(&bucket, "10.0.0.1").await.allowed,
                "request {i} should pass"
            );
        }

        let blocked = limiter.check(&bucket, "10.0.0.1").await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert!(blocked.retry_after.is_some());
    }

    #[tokio::test]
    async fn test_burst_extends_limit() {
        let limiter = RateLimiter::new(test_cache().await);
        let bucket = tight_bucket(2);

        for _ in 0..7 {
            assert!(limiter.check(&bucket, "10.0.0.1").await.allowed);
        }
        assert!(!limiter.check(&bucket, "10.0.0.1").await.allowed);
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let limiter = RateLimiter::new(test_cache().await);
        let bucket = tight_bucket(0);

        for _ in 0..6 {
            limiter.check(&bucket, "10.0.0.1").await;
        }
        assert!(!limiter.check(&bucket, "10.0.0.1").await.allowed);
        assert!(limiter.check(&bucket, "10.0.0.2").await.allowed);
    }

    #[tokio::test]
    async fn test_result_fields() {
        let limiter = RateLimiter::new(test_cache().await);

        let result = limiter.check(&tight_bucket(5), "10.0.0.1").await;
        assert!(result.allowed);
        assert_eq!(result.limit, 10);
        assert_eq!(result.remaining, 9);
        assert!(result.reset_at > 0);
        assert!(result.retry_after.is_none());
    }

    #[test]
    fn test_bucket_constructors() {
        let api = RateLimitBucket::api(1000);
        assert_eq!(api.name, "api");
        assert_eq!(api.burst, 50);

        let auth = RateLimitBucket::auth(30);
        assert_eq!(auth.name, "auth");
        assert_eq!(auth.burst, 10);
        assert_eq!(auth.total_limit(), 40);
    }
}
