//! Authentication middleware

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::jwt::JwtError;
use crate::domain::AccessService;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "AUTH_REQUIRED",
            message: "Authentication required".to_string(),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_EXPIRED",
            message: "Access token has expired".to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_INVALID",
            message: "Invalid access token".to_string(),
        }
    }

    pub fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: "forbidden",
            code: "ROLE_REQUIRED",
            message: "Missing required role".to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "internal_error",
            code: "INTERNAL",
            message: "Authentication unavailable".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub access: AccessService,
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
///
/// Validates the bearer access token and injects the `CurrentUser` with
/// roles loaded fresh from the database.
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = bearer_token(&request).ok_or_else(AuthError::required)?;

    let claims = state
        .access
        .tokens()
        .validate_access(token)
        .map_err(|e| match e {
            JwtError::Expired => AuthError::expired(),
            _ => AuthError::invalid(),
        })?;

    let user = state
        .access
        .current_user(claims.user_id())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load authenticated user");
            AuthError::unavailable()
        })?
        .ok_or_else(AuthError::invalid)?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn with_auth(value: &str) -> Request {
        Request::get("/")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&with_auth("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&with_auth("Basic abc")), None);
        assert_eq!(bearer_token(&with_auth("Bearer ")), None);
        assert_eq!(
            bearer_token(&Request::get("/").body(Body::empty()).unwrap()),
            None
        );
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(AuthError::required().status, StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::expired().code, "TOKEN_EXPIRED");
        assert_eq!(AuthError::forbidden().status, StatusCode::FORBIDDEN);
    }
}
