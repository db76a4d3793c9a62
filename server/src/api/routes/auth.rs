//! Authentication API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::auth::{AuthState, TokenPair, require_auth};
use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::types::ApiError;
use crate::data::oauth::SocialProvider;
use crate::domain::access::UserPublic;
use crate::domain::{AccessService, ClientInfo, CurrentUser};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 255, message = "Login must be 3-255 characters"))]
    pub login: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(max = 50, message = "First name must be at most 50 characters"))]
    pub first_name: String,
    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Login cannot be empty"))]
    pub login: String,
    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Token cannot be empty"))]
    pub refresh_token: String,
}

/// Where to send the user for Yandex sign-in
#[derive(Debug, Serialize, ToSchema)]
pub struct SocialLink {
    pub url: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SocialCallbackQuery {
    /// Authorization code issued by Yandex
    #[validate(length(min = 1, max = 255, message = "Code must be 1-255 characters"))]
    pub code: String,
}

#[derive(Clone)]
pub struct AuthRoutesState {
    pub access: AccessService,
}

#[derive(Clone)]
pub struct SocialRoutesState {
    pub access: AccessService,
    pub provider: Arc<dyn SocialProvider>,
}

/// Create auth routes
///
/// Credential endpoints are public; logout requires an access token.
/// Social login is mounted only when a provider is configured.
pub fn routes(access: AccessService, social: Option<Arc<dyn SocialProvider>>) -> Router {
    let protected = Router::new()
        .route("/logout", delete(logout))
        .route("/logout/all", delete(logout_all))
        .route_layer(from_fn_with_state(
            AuthState {
                access: access.clone(),
            },
            require_auth,
        ));

    let router = match social {
        Some(provider) => Router::new()
            .route("/social", get(social_link))
            .route("/social/yandex_auth", get(yandex_auth))
            .with_state(SocialRoutesState {
                access: access.clone(),
                provider,
            }),
        None => Router::new(),
    };

    router.merge(
        Router::new()
            .route("/signup", post(signup))
            .route("/login", post(login))
            .route("/refresh", post(refresh))
            .merge(protected)
            .with_state(AuthRoutesState { access }),
    )
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = UserPublic),
        (status = 400, description = "Login taken or invalid input")
    )
)]
pub async fn signup(
    State(state): State<AuthRoutesState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<UserPublic>), ApiError> {
    let user = state
        .access
        .signup(&req.login, &req.password, &req.first_name, &req.last_name)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Invalid login or password")
    )
)]
pub async fn login(
    State(state): State<AuthRoutesState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    Ok(Json(state.access.login(&req.login, &req.password, &client).await?))
}

/// Rotate a refresh token
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Token invalid or expired"),
        (status = 403, description = "Token no longer whitelisted")
    )
)]
pub async fn refresh(
    State(state): State<AuthRoutesState>,
    client: ClientInfo,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    Ok(Json(state.access.refresh(&req.refresh_token, &client).await?))
}

/// Link to the Yandex consent page
#[utoipa::path(
    get,
    path = "/api/v1/auth/social",
    tag = "auth",
    responses(
        (status = 200, description = "Authorize URL", body = SocialLink),
        (status = 404, description = "Social login not configured")
    )
)]
pub async fn social_link(State(state): State<SocialRoutesState>) -> Json<SocialLink> {
    Json(SocialLink {
        url: state.provider.authorize_url().to_string(),
    })
}

/// Exchange a Yandex authorization code for a token pair
#[utoipa::path(
    get,
    path = "/api/v1/auth/social/yandex_auth",
    tag = "auth",
    params(SocialCallbackQuery),
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Code missing or rejected by Yandex"),
        (status = 503, description = "Yandex unavailable")
    )
)]
pub async fn yandex_auth(
    State(state): State<SocialRoutesState>,
    ValidatedQuery(query): ValidatedQuery<SocialCallbackQuery>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state
        .access
        .social_login(state.provider.as_ref(), &query.code)
        .await?;
    Ok(Json(pair))
}

/// End the session of this device
#[utoipa::path(
    delete,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn logout(
    State(state): State<AuthRoutesState>,
    user: CurrentUser,
    client: ClientInfo,
) -> Result<StatusCode, ApiError> {
    state.access.logout(&user, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// End every session of the user
#[utoipa::path(
    delete,
    path = "/api/v1/auth/logout/all",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Logged out everywhere"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn logout_all(
    State(state): State<AuthRoutesState>,
    user: CurrentUser,
    client: ClientInfo,
) -> Result<StatusCode, ApiError> {
    state.access.logout_all(&user, &client).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::data::AccessRepository;
    use crate::data::oauth::{OAuthError, SocialProfile};
    use crate::domain::access::tests::memory_access;

    struct StubProvider;

    #[async_trait]
    impl SocialProvider for StubProvider {
        fn authorize_url(&self) -> &str {
            "https://oauth.test/authorize?response_type=code&client_id=cinema"
        }

        fn history_identity(&self) -> (&'static str, &'static str) {
            ("yandex", "https://ya.ru")
        }

        async fn fetch_profile(&self, code: &str) -> Result<SocialProfile, OAuthError> {
            match code {
                "granted" => Ok(SocialProfile {
                    login: "trinity".into(),
                    first_name: "Trinity".into(),
                    last_name: String::new(),
                }),
                "offline" => Err(OAuthError::Status {
                    status: 502,
                    message: "bad gateway".into(),
                }),
                _ => Err(OAuthError::Rejected("Code has expired".into())),
            }
        }
    }

    fn json_request(method: &str, uri: &str, agent: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, agent)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn logout_request(uri: &str, agent: &str, access_token: &str) -> Request<Body> {
        Request::delete(uri)
            .header(header::USER_AGENT, agent)
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn signup_neo(router: &Router) -> serde_json::Value {
        let (status, body) = send(
            router,
            json_request(
                "POST",
                "/signup",
                "curl",
                serde_json::json!({
                    "login": "neo",
                    "password": "followthewhiterabbit",
                    "first_name": "Thomas",
                    "last_name": "Anderson",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    async fn login_neo(router: &Router, agent: &str) -> (String, String) {
        let (status, body) = send(
            router,
            json_request(
                "POST",
                "/login",
                agent,
                serde_json::json!({"login": "neo", "password": "followthewhiterabbit"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    async fn refresh_with(router: &Router, agent: &str, refresh_token: &str) -> StatusCode {
        send(
            router,
            json_request(
                "POST",
                "/refresh",
                agent,
                serde_json::json!({ "refresh_token": refresh_token }),
            ),
        )
        .await
        .0
    }

    #[tokio::test]
    async fn test_login_issues_pair_and_rejects_wrong_password() {
        let (access, repo) = memory_access().await;
        let router = routes(access, None);
        signup_neo(&router).await;

        let (access_token, refresh_token) = login_neo(&router, "firefox").await;
        assert!(!access_token.is_empty());
        assert!(!refresh_token.is_empty());
        assert_eq!(repo.history_len(), 1);

        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/login",
                "firefox",
                serde_json::json!({"login": "neo", "password": "bluepill-bluepill"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_CREDENTIALS");

        let (status, _) = send(
            &router,
            json_request(
                "POST",
                "/login",
                "firefox",
                serde_json::json!({"login": "smith", "password": "whatever"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(repo.history_len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rotates_whitelisted_token() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);
        signup_neo(&router).await;

        let (_, refresh_token) = login_neo(&router, "firefox").await;
        assert_eq!(refresh_with(&router, "firefox", &refresh_token).await, StatusCode::OK);
        // The old token was replaced by the rotation
        assert_eq!(
            refresh_with(&router, "firefox", &refresh_token).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_refresh_outside_whitelist_is_forbidden() {
        let (access, _repo) = memory_access().await;
        let router = routes(access.clone(), None);
        let user = signup_neo(&router).await;
        let user_id = user["id"].as_str().unwrap().parse().unwrap();

        // Validly signed, but never handed out by a login
        let pair = access.tokens().issue_pair(user_id, &[]).unwrap();
        let (status, body) = send(
            &router,
            json_request(
                "POST",
                "/refresh",
                "firefox",
                serde_json::json!({ "refresh_token": pair.refresh_token }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "SESSION_REVOKED");
    }

    #[tokio::test]
    async fn test_logout_revokes_device_session() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);
        signup_neo(&router).await;

        let (access_token, refresh_token) = login_neo(&router, "firefox").await;
        let (status, _) = send(&router, logout_request("/logout", "firefox", &access_token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert_eq!(
            refresh_with(&router, "firefox", &refresh_token).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_logout_all_revokes_every_device() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);
        signup_neo(&router).await;

        let (access_token, _) = login_neo(&router, "firefox").await;
        let (_, phone_refresh) = login_neo(&router, "android").await;

        let (status, _) =
            send(&router, logout_request("/logout/all", "firefox", &access_token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        assert_eq!(
            refresh_with(&router, "android", &phone_refresh).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_logout_from_unseen_device_is_noop() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);
        signup_neo(&router).await;

        let (access_token, refresh_token) = login_neo(&router, "firefox").await;

        for uri in ["/logout", "/logout/all"] {
            let (status, _) = send(&router, logout_request(uri, "lynx", &access_token)).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        assert_eq!(refresh_with(&router, "firefox", &refresh_token).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_requires_access_token() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);

        let request = Request::delete("/logout").body(Body::empty()).unwrap();
        let (status, _) = send(&router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_social_link_and_login() {
        let (access, repo) = memory_access().await;
        let router = routes(access, Some(Arc::new(StubProvider)));

        let (status, body) = send(
            &router,
            Request::get("/social").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["url"].as_str().unwrap().contains("client_id=cinema"));

        for _ in 0..2 {
            let (status, body) = send(
                &router,
                Request::get("/social/yandex_auth?code=granted")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body["refresh_token"].is_string());
        }

        // Second sign-in reuses the account created by the first
        let user = repo.get_user_by_login("trinity").await.unwrap().unwrap();
        assert!(repo.user_has_role(user.id, "user").await.unwrap());
        let (history, total) = repo.list_login_history(user.id, 10, 0).await.unwrap();
        assert_eq!(total, 2);
        assert!(history.iter().all(|h| h.user_agent == "yandex" && h.host == "https://ya.ru"));
    }

    #[tokio::test]
    async fn test_social_login_errors() {
        let (access, repo) = memory_access().await;
        let router = routes(access, Some(Arc::new(StubProvider)));

        let (status, body) = send(
            &router,
            Request::get("/social/yandex_auth?code=stale")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_CODE");

        let (status, _) = send(
            &router,
            Request::get("/social/yandex_auth?code=offline")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, _) = send(
            &router,
            Request::get("/social/yandex_auth").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(repo.history_len(), 0);
    }

    #[tokio::test]
    async fn test_social_routes_absent_without_provider() {
        let (access, _repo) = memory_access().await;
        let router = routes(access, None);

        let (status, _) = send(
            &router,
            Request::get("/social").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_signup_validation() {
        let ok = SignupRequest {
            login: "neo".into(),
            password: "followthewhiterabbit".into(),
            first_name: "Thomas".into(),
            last_name: "Anderson".into(),
        };
        assert!(ok.validate().is_ok());

        let short = SignupRequest {
            password: "short".into(),
            ..ok
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_refresh_requires_token() {
        let req = RefreshRequest {
            refresh_token: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
