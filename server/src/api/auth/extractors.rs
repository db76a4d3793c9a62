//! Authorization extractors for Axum handlers
//!
//! `require_auth` puts the `CurrentUser` into request extensions; these
//! extractors read it back and check roles.
//!
//! # Usage
//!
//! ```no_run
//! # use cinema_server::api::auth::{Admin, RequireRole};
//! # use cinema_server::api::types::ApiError;
//! pub async fn list_sections(auth: RequireRole<Admin>) -> Result<(), ApiError> {
//!     let _admin_id = auth.user.id;
//!     Ok(())
//! }
//! ```

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::middleware::AuthError;
use crate::core::constants::ROLE_ADMIN;
use crate::domain::CurrentUser;

/// Marker trait naming the roles accepted by a route
pub trait RoleRequirement: Send + Sync + 'static {
    /// Any one of these roles grants access
    const ROLES: &'static [&'static str];
}

/// Administrator marker
pub struct Admin;
impl RoleRequirement for Admin {
    const ROLES: &'static [&'static str] = &[ROLE_ADMIN];
}

fn current_user(parts: &Parts) -> Result<CurrentUser, AuthError> {
    parts
        .extensions
        .get::<CurrentUser>()
        .cloned()
        .ok_or_else(AuthError::required)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
    }
}

/// Authenticated user holding one of `R::ROLES`
///
/// 401 without an authenticated user, 403 without a matching role.
pub struct RequireRole<R: RoleRequirement> {
    pub user: CurrentUser,
    _role: PhantomData<R>,
}

impl<S, R> FromRequestParts<S> for RequireRole<R>
where
    S: Send + Sync,
    R: RoleRequirement,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)?;
        if !R::ROLES.iter().any(|role| user.has_role(role)) {
            tracing::debug!(user_id = %user.id, required = ?R::ROLES, "Role check failed");
            return Err(AuthError::forbidden());
        }
        Ok(Self {
            user,
            _role: PhantomData,
        })
    }
}
