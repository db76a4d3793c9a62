//! Section API endpoints (admin)

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::auth::{Admin, AuthState, RequireRole, require_auth};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::domain::AccessService;
use crate::domain::access::SectionView;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSectionRequest {
    #[validate(length(min = 1, max = 255, message = "Section name must be 1-255 characters"))]
    pub name: String,
}

#[derive(Clone)]
pub struct SectionsApiState {
    pub access: AccessService,
}

pub fn routes(access: AccessService) -> Router<()> {
    Router::new()
        .route("/", get(list_sections).post(create_section))
        .route_layer(from_fn_with_state(
            AuthState {
                access: access.clone(),
            },
            require_auth,
        ))
        .with_state(SectionsApiState { access })
}

/// Create a section
#[utoipa::path(
    post,
    path = "/api/v1/sections",
    tag = "sections",
    security(("bearer" = [])),
    request_body = CreateSectionRequest,
    responses(
        (status = 201, description = "Section created", body = SectionView),
        (status = 400, description = "Section already exists")
    )
)]
pub async fn create_section(
    State(state): State<SectionsApiState>,
    _admin: RequireRole<Admin>,
    ValidatedJson(req): ValidatedJson<CreateSectionRequest>,
) -> Result<(StatusCode, Json<SectionView>), ApiError> {
    let section = state.access.create_section(req.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(section)))
}

/// List sections
#[utoipa::path(
    get,
    path = "/api/v1/sections",
    tag = "sections",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Sections", body = Vec<SectionView>)
    )
)]
pub async fn list_sections(
    State(state): State<SectionsApiState>,
    _admin: RequireRole<Admin>,
) -> Result<Json<Vec<SectionView>>, ApiError> {
    Ok(Json(state.access.list_sections().await?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::access::tests::test_access;

    async fn status_with(auth: Option<&str>) -> StatusCode {
        let app = routes(test_access().await);
        let mut request = Request::get("/");
        if let Some(value) = auth {
            request = request.header(header::AUTHORIZATION, value);
        }
        app.oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_requires_bearer_token() {
        assert_eq!(status_with(None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_with(Some("Basic abc")).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_with(Some("Bearer not-a-jwt")).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let access = test_access().await;
        let pair = access
            .tokens()
            .issue_pair(uuid::Uuid::new_v4(), &[])
            .unwrap();
        let app = routes(access);
        let response = app
            .oneshot(
                Request::get("/")
                    .header(header::AUTHORIZATION, format!("Bearer {}", pair.refresh_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
