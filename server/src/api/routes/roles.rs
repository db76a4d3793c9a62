//! Role API endpoints
//!
//! Everything except the permission check requires the admin role.

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::auth::{Admin, AuthState, RequireRole, require_auth};
use crate::api::extractors::{IdPath, ValidatedJson, ValidatedQuery};
use crate::api::types::ApiError;
use crate::data::types::PermissionGrant;
use crate::domain::access::{CheckRole, RoleView, UserPermission};
use crate::domain::{AccessService, CurrentUser};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionRequest {
    pub section_id: Uuid,
    pub can_view: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// Role name with its complete permission set
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RoleRequest {
    #[validate(length(min = 1, max = 255, message = "Role name must be 1-255 characters"))]
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<PermissionRequest>,
}

impl RoleRequest {
    fn grants(&self) -> Vec<PermissionGrant> {
        self.permissions
            .iter()
            .map(|p| PermissionGrant {
                section_id: p.section_id,
                can_view: p.can_view,
                can_edit: p.can_edit,
                can_delete: p.can_delete,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckRoleQuery {
    #[validate(length(min = 1, message = "role_name cannot be empty"))]
    pub role_name: String,
    /// Defaults to the caller
    pub user_id: Option<Uuid>,
}

/// Grant (`delete = false`) or revoke a role
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UserRoleRequest {
    #[validate(length(min = 1, message = "Role name cannot be empty"))]
    pub name: String,
    pub delete: bool,
    /// Defaults to the caller
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionQuery {
    #[validate(length(min = 1, message = "section_name cannot be empty"))]
    pub section_name: String,
}

#[derive(Clone)]
pub struct RolesApiState {
    pub access: AccessService,
}

pub fn routes(access: AccessService) -> Router<()> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/user", get(check_role).patch(edit_user_role))
        .route("/permissions", get(check_permission))
        .route("/{id}", get(get_role).patch(update_role).delete(delete_role))
        .route_layer(from_fn_with_state(
            AuthState {
                access: access.clone(),
            },
            require_auth,
        ))
        .with_state(RolesApiState { access })
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = "roles",
    security(("bearer" = [])),
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleView),
        (status = 400, description = "Duplicate name or unknown section")
    )
)]
pub async fn create_role(
    State(state): State<RolesApiState>,
    _admin: RequireRole<Admin>,
    ValidatedJson(req): ValidatedJson<RoleRequest>,
) -> Result<(StatusCode, Json<RoleView>), ApiError> {
    let role = state.access.create_role(&req.name, &req.grants()).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// List roles with permissions
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "roles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Roles", body = Vec<RoleView>)
    )
)]
pub async fn list_roles(
    State(state): State<RolesApiState>,
    _admin: RequireRole<Admin>,
) -> Result<Json<Vec<RoleView>>, ApiError> {
    Ok(Json(state.access.list_roles().await?))
}

/// Check whether a user holds a role
#[utoipa::path(
    get,
    path = "/api/v1/roles/user",
    tag = "roles",
    security(("bearer" = [])),
    params(CheckRoleQuery),
    responses(
        (status = 200, description = "Role check", body = CheckRole)
    )
)]
pub async fn check_role(
    State(state): State<RolesApiState>,
    admin: RequireRole<Admin>,
    ValidatedQuery(query): ValidatedQuery<CheckRoleQuery>,
) -> Result<Json<CheckRole>, ApiError> {
    let user_id = query.user_id.unwrap_or(admin.user.id);
    Ok(Json(state.access.check_role(user_id, &query.role_name).await?))
}

/// Grant or revoke a role
#[utoipa::path(
    patch,
    path = "/api/v1/roles/user",
    tag = "roles",
    security(("bearer" = [])),
    request_body = UserRoleRequest,
    responses(
        (status = 204, description = "Role assignment changed"),
        (status = 400, description = "Unknown role, already held, or not held")
    )
)]
pub async fn edit_user_role(
    State(state): State<RolesApiState>,
    admin: RequireRole<Admin>,
    ValidatedJson(req): ValidatedJson<UserRoleRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = req.user_id.unwrap_or(admin.user.id);
    state
        .access
        .edit_user_role(user_id, &req.name, req.delete)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Effective permission of the caller on a section
#[utoipa::path(
    get,
    path = "/api/v1/roles/permissions",
    tag = "roles",
    security(("bearer" = [])),
    params(PermissionQuery),
    responses(
        (status = 200, description = "Merged permission", body = UserPermission),
        (status = 400, description = "Unknown section or no permissions")
    )
)]
pub async fn check_permission(
    State(state): State<RolesApiState>,
    user: CurrentUser,
    ValidatedQuery(query): ValidatedQuery<PermissionQuery>,
) -> Result<Json<UserPermission>, ApiError> {
    Ok(Json(state.access.check_permission(&user, &query.section_name).await?))
}

/// Role by id
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    tag = "roles",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = RoleView),
        (status = 404, description = "Role not found")
    )
)]
pub async fn get_role(
    State(state): State<RolesApiState>,
    _admin: RequireRole<Admin>,
    IdPath(id): IdPath,
) -> Result<Json<RoleView>, ApiError> {
    Ok(Json(state.access.get_role(id).await?))
}

/// Rename a role and replace its permissions
#[utoipa::path(
    patch,
    path = "/api/v1/roles/{id}",
    tag = "roles",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Updated role", body = RoleView),
        (status = 404, description = "Role not found")
    )
)]
pub async fn update_role(
    State(state): State<RolesApiState>,
    _admin: RequireRole<Admin>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<RoleRequest>,
) -> Result<Json<RoleView>, ApiError> {
    Ok(Json(state.access.update_role(id, &req.name, &req.grants()).await?))
}

/// Delete a role
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    tag = "roles",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found")
    )
)]
pub async fn delete_role(
    State(state): State<RolesApiState>,
    _admin: RequireRole<Admin>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    state.access.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
