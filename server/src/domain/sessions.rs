//! Refresh token whitelist
//!
//! One hash per user under `v1:sessions:{user_id}`. Each field is a device
//! fingerprint and holds the only refresh token accepted for that device,
//! with a field TTL equal to the refresh token lifetime.
//!
//! Slot lifecycle: `issue` fills an empty slot (first writer wins), `rotate`
//! only replaces an existing one, `revoke`/`revoke_all` or the field TTL
//! empty it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::data::cache::{CacheError, CacheKey, CacheService};
use crate::utils::crypto::constant_time_eq;

/// Hashed identity of a client device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    /// Hex SHA-256 over the length-prefixed user agent, host and user id
    ///
    /// Missing headers are passed as empty strings.
    pub fn new(user_agent: &str, host: &str, user_id: Uuid) -> Self {
        let user_id = user_id.to_string();
        let mut hasher = Sha256::new();
        for part in [user_agent, host, user_id.as_str()] {
            hasher.update((part.len() as u64).to_be_bytes());
            hasher.update(part.as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone)]
pub struct SessionWhitelist {
    cache: Arc<CacheService>,
    ttl: Duration,
}

impl SessionWhitelist {
    pub fn new(cache: Arc<CacheService>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Whitelist `token` if the device has no live slot
    ///
    /// Returns false and leaves the existing token in place otherwise.
    pub async fn issue(
        &self,
        user_id: Uuid,
        device: &DeviceFingerprint,
        token: &str,
    ) -> Result<bool, CacheError> {
        let issued = self
            .cache
            .hset_nx(&CacheKey::sessions(user_id), device.as_str(), token, self.ttl)
            .await?;
        tracing::debug!(%user_id, %device, issued, "Refresh session issue");
        Ok(issued)
    }

    /// Replace the token of a live slot and restart its TTL
    ///
    /// Returns false when the slot is absent; nothing is written then.
    pub async fn rotate(
        &self,
        user_id: Uuid,
        device: &DeviceFingerprint,
        token: &str,
    ) -> Result<bool, CacheError> {
        let rotated = self
            .cache
            .hset_xx(&CacheKey::sessions(user_id), device.as_str(), token, self.ttl)
            .await?;
        if !rotated {
            tracing::warn!(%user_id, %device, "Rotate on empty refresh session slot");
        }
        Ok(rotated)
    }

    /// True iff the slot is live and holds exactly `token`
    pub async fn validate(
        &self,
        user_id: Uuid,
        device: &DeviceFingerprint,
        token: &str,
    ) -> Result<bool, CacheError> {
        let stored = self
            .cache
            .hget(&CacheKey::sessions(user_id), device.as_str())
            .await?;
        Ok(stored.is_some_and(|stored| constant_time_eq(&stored, token)))
    }

    pub async fn revoke(&self, user_id: Uuid, device: &DeviceFingerprint) -> Result<bool, CacheError> {
        let removed = self
            .cache
            .hdel(&CacheKey::sessions(user_id), &[device.as_str().to_string()])
            .await?;
        tracing::debug!(%user_id, %device, removed, "Refresh session revoked");
        Ok(removed > 0)
    }

    /// Drop every device slot of the user, returning how many were live
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, CacheError> {
        let key = CacheKey::sessions(user_id);
        let fields: Vec<String> = self.cache.hgetall(&key).await?.into_keys().collect();
        if fields.is_empty() {
            return Ok(0);
        }
        let removed = self.cache.hdel(&key, &fields).await?;
        tracing::debug!(%user_id, removed, "All refresh sessions revoked");
        Ok(removed)
    }
}
