//! OpenAPI specification and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::auth::TokenPair;
use crate::api::routes::{auth, films, genres, health, persons, roles, sections, users};
use crate::api::types::PaginationMeta;
use crate::domain::access::{
    CheckRole, LoginHistoryEntry, PermissionView, RoleView, SectionView, UserPermission,
    UserPublic,
};
use crate::domain::catalog::{
    FilmDetail, FilmInPerson, FilmShort, GenreShort, PersonDetail, PersonRole, PersonShort,
};

/// Registers the `bearer` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cinema API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Film catalog and authentication service"
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "films", description = "Film catalog"),
        (name = "genres", description = "Genre catalog"),
        (name = "persons", description = "Person catalog"),
        (name = "auth", description = "Signup, password and Yandex login, token refresh"),
        (name = "users", description = "Profile and login history"),
        (name = "roles", description = "Roles and permissions"),
        (name = "sections", description = "Permission sections")
    ),
    paths(
        // Health
        health::health,
        // Catalog
        films::list_films,
        films::search_films,
        films::get_film,
        genres::list_genres,
        genres::get_genre,
        persons::search_persons,
        persons::get_person,
        persons::person_films,
        // Auth
        auth::signup,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::logout_all,
        auth::social_link,
        auth::yandex_auth,
        // Users
        users::patch_user,
        users::login_history,
        users::search_users,
        // Roles
        roles::create_role,
        roles::list_roles,
        roles::check_role,
        roles::edit_user_role,
        roles::check_permission,
        roles::get_role,
        roles::update_role,
        roles::delete_role,
        // Sections
        sections::create_section,
        sections::list_sections,
    ),
    components(schemas(
        PaginationMeta,
        health::HealthResponse,
        health::DependencyHealth,
        // Catalog
        FilmShort,
        FilmDetail,
        GenreShort,
        PersonShort,
        PersonDetail,
        PersonRole,
        FilmInPerson,
        // Auth
        TokenPair,
        auth::SignupRequest,
        auth::LoginRequest,
        auth::RefreshRequest,
        auth::SocialLink,
        // Users
        UserPublic,
        LoginHistoryEntry,
        users::PatchUserRequest,
        // Roles
        RoleView,
        PermissionView,
        SectionView,
        CheckRole,
        UserPermission,
        roles::RoleRequest,
        roles::PermissionRequest,
        roles::UserRoleRequest,
        sections::CreateSectionRequest,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Cinema API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/films",
            "/api/v1/persons/{id}/film",
            "/api/v1/auth/refresh",
            "/api/v1/auth/social/yandex_auth",
            "/api/v1/roles/{id}",
            "/api/v1/sections",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
