//! Type-safe cache key builder with versioning

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::core::constants::CACHE_KEY_VERSION;

/// Type-safe cache key builder
///
/// All keys are prefixed with a version (e.g., "v1:") to allow
/// invalidating all cached data on schema changes.
pub struct CacheKey;

impl CacheKey {
    // =========================================================================
    // Catalog entities
    // =========================================================================

    pub fn film(id: Uuid) -> String {
        format!("{}:film:{}", CACHE_KEY_VERSION, id)
    }

    pub fn genre(id: Uuid) -> String {
        format!("{}:genre:{}", CACHE_KEY_VERSION, id)
    }

    pub fn person(id: Uuid) -> String {
        format!("{}:person:{}", CACHE_KEY_VERSION, id)
    }

    /// Cache key for the films a person took part in
    pub fn person_films(id: Uuid) -> String {
        format!("{}:person_films:{}", CACHE_KEY_VERSION, id)
    }

    /// Start a parameterized list/search key for `operation`
    pub fn list(operation: &'static str) -> ListKey {
        ListKey {
            operation,
            hasher: Sha256::new(),
        }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Hash holding one refresh token per device of a user
    pub fn sessions(user_id: Uuid) -> String {
        format!("{}:sessions:{}", CACHE_KEY_VERSION, user_id)
    }

    // =========================================================================
    // Rate Limiting
    // =========================================================================

    /// Cache key for rate limit counter
    pub fn rate_limit(bucket: &str, identifier: &str) -> String {
        format!("{}:ratelimit:{}:{}", CACHE_KEY_VERSION, bucket, identifier)
    }
}

/// Builder for `v1:{operation}:{digest}` keys
///
/// Each parameter is fed into the digest as `name=<len>:<value>;`, or
/// `name=-;` when absent. Callers add parameters in a fixed order.
pub struct ListKey {
    operation: &'static str,
    hasher: Sha256,
}

impl ListKey {
    pub fn param(mut self, name: &str, value: Option<&str>) -> Self {
        self.hasher.update(name.as_bytes());
        match value {
            Some(value) => {
                self.hasher.update(format!("={}:", value.len()).as_bytes());
                self.hasher.update(value.as_bytes());
            }
            None => self.hasher.update(b"=-"),
        }
        self.hasher.update(b";");
        self
    }

    pub fn build(self) -> String {
        format!(
            "{}:{}:{}",
            CACHE_KEY_VERSION,
            self.operation,
            hex::encode(self.hasher.finalize())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_keys() {
        let id = Uuid::nil();
        assert_eq!(
            CacheKey::film(id),
            "v1:film:00000000-0000-0000-0000-000000000000"
        );
        assert!(CacheKey::genre(id).starts_with("v1:genre:"));
        assert!(CacheKey::person(id).starts_with("v1:person:"));
        assert!(CacheKey::person_films(id).starts_with("v1:person_films:"));
        assert!(CacheKey::sessions(id).starts_with("v1:sessions:"));
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(
            CacheKey::rate_limit("api", "10.0.0.1"),
            "v1:ratelimit:api:10.0.0.1"
        );
    }

    #[test]
    fn test_list_key_deterministic() {
        let a = CacheKey::list("films_search")
            .param("query", Some("matrix"))
            .param("page", Some("1"))
            .build();
        let b = CacheKey::list("films_search")
            .param("query", Some("matrix"))
            .param("page", Some("1"))
            .build();
        assert_eq!(a, b);
        assert!(a.starts_with("v1:films_search:"));
        assert_eq!(a.len(), "v1:films_search:".len() + 64);
    }

    #[test]
    fn test_list_key_absent_differs_from_empty() {
        let absent = CacheKey::list("films_list").param("genre", None).build();
        let empty = CacheKey::list("films_list").param("genre", Some("")).build();
        let dash = CacheKey::list("films_list").param("genre", Some("-")).build();
        assert_ne!(absent, empty);
        assert_ne!(absent, dash);
    }

    #[test]
    fn test_list_key_delimiters_do_not_collide() {
        let a = CacheKey::list("films_search")
            .param("query", Some("a;page=1:1"))
            .param("page", Some("2"))
            .build();
        let b = CacheKey::list("films_search")
            .param("query", Some("a"))
            .param("page", Some("1"))
            .build();
        assert_ne!(a, b);
    }

    #[test]
    fn test_list_key_operation_namespaces() {
        let films = CacheKey::list("films_search")
            .param("query", Some("x"))
            .build();
        let persons = CacheKey::list("persons_search")
            .param("query", Some("x"))
            .build();
        assert_ne!(films, persons);
    }
}
