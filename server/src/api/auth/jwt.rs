//! JWT access and refresh token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// JWT validation error
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Expected a token of type {expected}")]
    WrongType { expected: TokenType },

    #[error("Failed to create JWT: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "access"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims shared by both token kinds
///
/// Access tokens carry the user's role ids; refresh tokens carry none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Uuid>>,
}

impl Claims {
    pub fn access(user_id: Uuid, roles: &[Uuid], ttl: Duration) -> Self {
        Self::new(user_id, TokenType::Access, Some(roles.to_vec()), ttl)
    }

    pub fn refresh(user_id: Uuid, ttl: Duration) -> Self {
        Self::new(user_id, TokenType::Refresh, None, ttl)
    }

    fn new(user_id: Uuid, token_type: TokenType, roles: Option<Vec<Uuid>>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            roles,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Access and refresh token issued together
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Sign claims with HS256
pub fn create_token(signing_key: &[u8], claims: &Claims) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| JwtError::Encode(e.to_string()))
}

/// Validate signature, expiry and token kind
pub fn validate_token(
    token: &str,
    signing_key: &[u8],
    expected: TokenType,
) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Invalid(e.to_string()),
        })?;

    if token_data.claims.token_type != expected {
        return Err(JwtError::WrongType { expected });
    }
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> Vec<u8> {
        vec![7u8; 32]
    }

    #[test]
    fn test_access_roundtrip() {
        let key = test_key();
        let user = Uuid::new_v4();
        let role = Uuid::new_v4();
        let token = create_token(&key, &Claims::access(user, &[role], Duration::minutes(15))).unwrap();

        let claims = validate_token(&token, &key, TokenType::Access).unwrap();
        assert_eq!(claims.user_id(), user);
        assert_eq!(claims.roles, Some(vec![role]));
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_has_no_roles_claim() {
        let key = test_key();
        let token = create_token(&key, &Claims::refresh(Uuid::new_v4(), Duration::days(30))).unwrap();
        let claims = validate_token(&token, &key, TokenType::Refresh).unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert!(claims.roles.is_none());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let key = test_key();
        let token = create_token(&key, &Claims::refresh(Uuid::new_v4(), Duration::days(1))).unwrap();
        assert!(matches!(
            validate_token(&token, &key, TokenType::Access),
            Err(JwtError::WrongType {
                expected: TokenType::Access
            })
        ));
    }

    #[test]
    fn test_invalid_signature() {
        let token =
            create_token(&[0u8; 32], &Claims::refresh(Uuid::new_v4(), Duration::days(1))).unwrap();
        assert!(matches!(
            validate_token(&token, &[1u8; 32], TokenType::Refresh),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired() {
        let key = test_key();
        let token =
            create_token(&key, &Claims::refresh(Uuid::new_v4(), Duration::minutes(-10))).unwrap();
        assert!(matches!(
            validate_token(&token, &key, TokenType::Refresh),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(
            validate_token("not.a.jwt", &test_key(), TokenType::Refresh),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_unique_jti() {
        let user = Uuid::new_v4();
        let c1 = Claims::refresh(user, Duration::days(1));
        let c2 = Claims::refresh(user, Duration::days(1));
        assert_ne!(c1.jti, c2.jti);
    }

    #[test]
    fn test_type_claim_name() {
        let claims = Claims::refresh(Uuid::nil(), Duration::days(1));
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["type"], "refresh");
        assert!(value.get("roles").is_none());
    }
}
