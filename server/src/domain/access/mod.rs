//! Accounts, roles, sections and permissions
//!
//! `AccessService` owns the auth store repository, the token manager and the
//! refresh session whitelist. Its operations are split by concern:
//! - `auth` - signup, password and social login, refresh, logout
//! - `users` - profile, login history, role assignment, permission checks
//! - `roles` - role CRUD with section permissions
//! - `sections` - section CRUD

mod auth;
mod roles;
mod sections;
pub mod types;
mod users;

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

pub use types::{
    CheckRole, ClientInfo, CurrentUser, LoginHistoryEntry, PermissionView, RoleView, SectionView,
    UserPermission, UserPublic,
};
pub use users::bootstrap_admin;

use crate::api::auth::{JwtError, TokenManager};
use crate::data::cache::CacheError;
use crate::data::oauth::OAuthError;
use crate::data::AccessRepository;
use crate::data::postgres::PostgresError;
use crate::domain::sessions::SessionWhitelist;
use crate::utils::crypto;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error(transparent)]
    Token(#[from] JwtError),

    #[error("Token subject no longer exists")]
    UnknownSubject,

    #[error("Refresh token is not whitelisted")]
    NotWhitelisted,

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(PostgresError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Social(#[from] OAuthError),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

impl AccessError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }
}

impl From<PostgresError> for AccessError {
    fn from(e: PostgresError) -> Self {
        match e {
            PostgresError::Conflict(message) => Self::BadRequest {
                code: "ALREADY_EXISTS",
                message,
            },
            other => Self::Database(other),
        }
    }
}

/// Auth store operations
#[derive(Clone)]
pub struct AccessService {
    repo: Arc<dyn AccessRepository>,
    tokens: Arc<TokenManager>,
    sessions: SessionWhitelist,
}

impl AccessService {
    pub fn new(
        repo: Arc<dyn AccessRepository>,
        tokens: Arc<TokenManager>,
        sessions: SessionWhitelist,
    ) -> Self {
        Self {
            repo,
            tokens,
            sessions,
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}

/// Argon2 runs on the blocking pool
async fn hash_password(password: &str) -> Result<String, AccessError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || crypto::hash_password(&password))
        .await
        .map_err(|e| AccessError::Hash(e.to_string()))?
        .map_err(|e| AccessError::Hash(e.to_string()))
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, AccessError> {
    let (password, hash) = (password.to_string(), hash.to_string());
    let result = tokio::task::spawn_blocking(move || crypto::verify_password(&password, &hash))
        .await
        .map_err(|e| AccessError::Hash(e.to_string()))?;

    match result {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            Ok(false)
        }
    }
}

fn role_ids(roles: &[crate::data::types::RoleRow]) -> Vec<Uuid> {
    roles.iter().map(|r| r.id).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use super::*;
    use crate::data::cache::tests::memory_cache;
    use crate::data::traits::tests::MemoryAccessRepository;

    /// Service over an in-memory auth store, returned with the store itself
    pub(crate) async fn memory_access() -> (AccessService, Arc<MemoryAccessRepository>) {
        let repo = Arc::new(MemoryAccessRepository::new());
        let tokens = Arc::new(TokenManager::new(vec![9u8; 32], 15, 60));
        let sessions = SessionWhitelist::new(memory_cache().await, Duration::from_secs(3600));
        (AccessService::new(repo.clone(), tokens, sessions), repo)
    }

    /// Service over an in-memory auth store
    pub(crate) async fn test_access() -> AccessService {
        memory_access().await.0
    }

    #[tokio::test]
    async fn test_refresh_rejects_bad_token_before_store() {
        let (access, repo) = memory_access().await;
        let err = access
            .refresh("garbage", &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Token(_)));

        let pair = access.tokens().issue_pair(Uuid::new_v4(), &[]).unwrap();
        let err = access
            .refresh(&pair.access_token, &ClientInfo::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Token(JwtError::WrongType { .. })));
        assert_eq!(repo.history_len(), 0);
    }

    #[test]
    fn test_conflict_becomes_bad_request() {
        let err = AccessError::from(PostgresError::Conflict("Login already exists".into()));
        match err {
            AccessError::BadRequest { code, message } => {
                assert_eq!(code, "ALREADY_EXISTS");
                assert_eq!(message, "Login already exists");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        let err = AccessError::from(PostgresError::Config("no url".into()));
        assert!(matches!(err, AccessError::Database(_)));
    }

    #[tokio::test]
    async fn test_password_helpers() {
        let hash = hash_password("password").await.unwrap();
        assert!(verify_password("password", &hash).await.unwrap());
        assert!(!verify_password("wrong", &hash).await.unwrap());
        assert!(!verify_password("password", "garbage").await.unwrap());
    }
}
