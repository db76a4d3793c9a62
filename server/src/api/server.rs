//! API server initialization

use std::net::SocketAddr;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware;
use super::openapi::{openapi_json, swagger_ui_html};
use super::rate_limit::{KeyExtractor, RateLimitState, rate_limit_middleware};
use super::routes::{auth, films, genres, health, persons, roles, sections, users};
use crate::core::CoreApp;
use crate::core::constants::{AUTH_BODY_LIMIT, DEFAULT_BODY_LIMIT};
use crate::data::cache::RateLimitBucket;
use crate::domain::catalog::CatalogCache;
use crate::domain::{
    AccessService, FilmService, GenreService, PersonService, SessionWhitelist,
};

pub struct ApiServer {
    app: CoreApp,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        Self { app }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self { app } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = Self::router(&app);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "API server listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }

    /// Assemble every route group with its middleware stack
    fn router(app: &CoreApp) -> Router {
        let access = match app.postgres {
            Some(ref postgres) => {
                let sessions = SessionWhitelist::new(app.cache.clone(), app.tokens.refresh_ttl());
                Some(AccessService::new(
                    postgres.clone(),
                    app.tokens.clone(),
                    sessions,
                ))
            }
            None => {
                tracing::warn!("PostgreSQL not configured, auth routes disabled");
                None
            }
        };
        Self::routes(app, access)
    }

    /// Routes over an explicit auth service; `None` leaves the auth groups out
    fn routes(app: &CoreApp, access: Option<AccessService>) -> Router {
        let rate_limit = &app.config.rate_limit;
        let key_extractor = KeyExtractor::from_config(rate_limit.per_ip);
        let rate_limiter = app.rate_limiter.clone();
        let bypass_header = rate_limit.bypass_header.clone();

        let make_rate_limit_state = |bucket: RateLimitBucket| RateLimitState {
            limiter: rate_limiter.clone(),
            bucket,
            key_extractor,
            bypass_header: bypass_header.clone(),
        };
        let limited = |routes: Router, bucket: RateLimitBucket| {
            if rate_limit.enabled {
                routes.layer(axum::middleware::from_fn_with_state(
                    make_rate_limit_state(bucket),
                    rate_limit_middleware,
                ))
            } else {
                routes
            }
        };

        let catalog = CatalogCache::new(app.cache.clone());
        let film_service = FilmService::new(app.store.clone(), catalog.clone());
        let genre_service = GenreService::new(app.store.clone(), catalog.clone());
        let person_service = PersonService::new(app.store.clone(), catalog, film_service.clone());

        let api_bucket = || RateLimitBucket::api(rate_limit.api_rpm);

        let router = Router::new()
            .route("/api/openapi.json", get(openapi_json))
            .route("/api/docs", get(swagger_ui_html))
            .route("/api/docs/", get(swagger_ui_html))
            .nest(
                "/api/v1/health",
                health::routes(app.cache.clone(), app.store.clone()),
            )
            .nest(
                "/api/v1/films",
                limited(films::routes(film_service), api_bucket()),
            )
            .nest(
                "/api/v1/genres",
                limited(genres::routes(genre_service), api_bucket()),
            )
            .nest(
                "/api/v1/persons",
                limited(persons::routes(person_service), api_bucket()),
            );

        let router = match access {
            Some(access) => {
                // Brute force protection runs on its own, tighter bucket
                let auth_routes = auth::routes(access.clone(), app.social.clone())
                    .layer(DefaultBodyLimit::max(AUTH_BODY_LIMIT));
                router
                    .nest(
                        "/api/v1/auth",
                        limited(auth_routes, RateLimitBucket::auth(rate_limit.auth_rpm)),
                    )
                    .nest(
                        "/api/v1/users",
                        limited(users::routes(access.clone()), api_bucket()),
                    )
                    .nest(
                        "/api/v1/roles",
                        limited(roles::routes(access.clone()), api_bucket()),
                    )
                    .nest(
                        "/api/v1/sections",
                        limited(sections::routes(access), api_bucket()),
                    )
            }
            None => router,
        };

        router
            .fallback(middleware::handle_404)
            .layer(CompressionLayer::new())
            .layer(middleware::cors())
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::api::auth::TokenManager;
    use crate::core::config::{AppConfig, SearchBackendType};
    use crate::core::{CliConfig, ShutdownService};
    use crate::data::cache::RateLimiter;
    use crate::data::cache::tests::memory_cache;
    use crate::data::search::MemoryStore;
    use crate::domain::access::tests::test_access;

    async fn test_app(rate_limit_enabled: bool) -> CoreApp {
        let mut config = AppConfig::load(&CliConfig {
            search_backend: Some(SearchBackendType::Memory),
            ..Default::default()
        })
        .unwrap();
        config.rate_limit.enabled = rate_limit_enabled;
        config.rate_limit.api_rpm = 2;

        let cache = memory_cache().await;
        CoreApp {
            shutdown: ShutdownService::new(None),
            config,
            rate_limiter: Arc::new(RateLimiter::new(cache.clone())),
            cache,
            store: Arc::new(MemoryStore::new()),
            postgres: None,
            tokens: Arc::new(TokenManager::new(vec![7u8; 32], 15, 60)),
            social: None,
        }
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let router = ApiServer::router(&test_app(false).await);
        let response = router.oneshot(get("/api/v1/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "ROUTE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_auth_routes_absent_without_postgres() {
        let router = ApiServer::router(&test_app(false).await);
        let response = router
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"login":"neo","password":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_auth_groups_mounted_with_access() {
        let app = test_app(false).await;
        let router = ApiServer::routes(&app, Some(test_access().await));

        let response = router
            .clone()
            .oneshot(
                Request::post("/api/v1/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"login":"neo","password":"secret"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router.clone().oneshot(get("/api/v1/roles")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // No provider configured
        let response = router.oneshot(get("/api/v1/auth/social")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_openapi_mounted() {
        let router = ApiServer::router(&test_app(false).await);
        let response = router.clone().oneshot(get("/api/v1/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(get("/api/openapi.json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_routes_rate_limited() {
        let router = ApiServer::router(&test_app(true).await)
            .layer(MockConnectInfo(SocketAddr::from(([10, 0, 0, 1], 4000))));

        for _ in 0..2 {
            let response = router.clone().oneshot(get("/api/v1/genres")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = router.oneshot(get("/api/v1/genres")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
