//! User API endpoints

use axum::extract::State;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::auth::{Admin, AuthState, RequireRole, require_auth};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::{
    ApiError, PageQuery, PaginatedResponse, default_page, default_page_size, validate_page,
    validate_page_size,
};
use crate::domain::access::{LoginHistoryEntry, UserPublic};
use crate::domain::{AccessService, CurrentUser, Pagination};

/// Request body for changing credentials
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PatchUserRequest {
    #[validate(length(min = 3, max = 255, message = "Login must be 3-255 characters"))]
    pub login: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchUsersQuery {
    /// Substring of login, first or last name; empty matches everyone
    #[serde(default)]
    #[validate(length(max = 255, message = "query must be at most 255 characters"))]
    pub query: String,
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(custom(function = "validate_page_size"))]
    pub page_size: u32,
}

#[derive(Clone)]
pub struct UsersApiState {
    pub access: AccessService,
}

pub fn routes(access: AccessService) -> Router<()> {
    Router::new()
        .route("/", patch(patch_user))
        .route("/login_history", get(login_history))
        .route("/search", get(search_users))
        .route_layer(from_fn_with_state(
            AuthState {
                access: access.clone(),
            },
            require_auth,
        ))
        .with_state(UsersApiState { access })
}

/// Change login and password of the current user
#[utoipa::path(
    patch,
    path = "/api/v1/users",
    tag = "users",
    security(("bearer" = [])),
    request_body = PatchUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserPublic),
        (status = 400, description = "Login taken or invalid input")
    )
)]
pub async fn patch_user(
    State(state): State<UsersApiState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<PatchUserRequest>,
) -> Result<Json<UserPublic>, ApiError> {
    Ok(Json(state.access.patch_user(&user, &req.login, &req.password).await?))
}

/// Login history of the current user, newest first
#[utoipa::path(
    get,
    path = "/api/v1/users/login_history",
    tag = "users",
    security(("bearer" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Login history with pagination metadata")
    )
)]
pub async fn login_history(
    State(state): State<UsersApiState>,
    user: CurrentUser,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> Result<Json<PaginatedResponse<LoginHistoryEntry>>, ApiError> {
    let page = Pagination::from(page);
    let (entries, total) = state.access.login_history(&user, page).await?;
    Ok(Json(PaginatedResponse::new(entries, page, total)))
}

/// Search users (admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    tag = "users",
    security(("bearer" = [])),
    params(SearchUsersQuery),
    responses(
        (status = 200, description = "Users with pagination metadata"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn search_users(
    State(state): State<UsersApiState>,
    _admin: RequireRole<Admin>,
    ValidatedQuery(query): ValidatedQuery<SearchUsersQuery>,
) -> Result<Json<PaginatedResponse<UserPublic>>, ApiError> {
    let page = Pagination::new(query.page, query.page_size);
    let (users, total) = state.access.search_users(query.query.trim(), page).await?;
    Ok(Json(PaginatedResponse::new(users, page, total)))
}
