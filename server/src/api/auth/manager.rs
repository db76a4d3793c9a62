//! Token manager

use std::fmt;

use uuid::Uuid;

use super::jwt::{Claims, JwtError, TokenPair, TokenType, create_token, validate_token};
use crate::core::AuthConfig;
use crate::core::constants::MAX_TOKEN_TTL_MINS;
use crate::utils::crypto;

/// Issues and validates JWTs with the configured secret and lifetimes
pub struct TokenManager {
    signing_key: Vec<u8>,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Lifetime in minutes, clamped to `MAX_TOKEN_TTL_MINS`
fn lifetime(mins: u64) -> chrono::Duration {
    i64::try_from(mins.min(MAX_TOKEN_TTL_MINS))
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .unwrap_or(chrono::Duration::zero())
}

impl TokenManager {
    pub fn new(signing_key: Vec<u8>, access_ttl_mins: u64, refresh_ttl_mins: u64) -> Self {
        Self {
            signing_key,
            access_ttl: lifetime(access_ttl_mins),
            refresh_ttl: lifetime(refresh_ttl_mins),
        }
    }

    /// Build from configuration
    ///
    /// Without a configured secret a random key is generated, so tokens do
    /// not survive a restart.
    pub fn from_config(config: &AuthConfig) -> Self {
        let signing_key = match &config.secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!("No JWT secret configured, using an ephemeral key");
                crypto::generate_token(32).into_bytes()
            }
        };
        Self::new(
            signing_key,
            config.access_token_ttl_mins,
            config.refresh_token_ttl_mins,
        )
    }

    /// Lifetime of refresh tokens, also the whitelist slot TTL
    pub fn refresh_ttl(&self) -> std::time::Duration {
        self.refresh_ttl.to_std().unwrap_or_default()
    }

    pub fn issue_pair(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<TokenPair, JwtError> {
        let access_token = create_token(
            &self.signing_key,
            &Claims::access(user_id, role_ids, self.access_ttl),
        )?;
        let refresh_token =
            create_token(&self.signing_key, &Claims::refresh(user_id, self.refresh_ttl))?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.signing_key, TokenType::Access)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.signing_key, TokenType::Refresh)
    }
}
