//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::data::{CacheService, DocumentStore};

/// State of one backing service
#[derive(Debug, Serialize, ToSchema)]
pub struct DependencyHealth {
    pub backend: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when every dependency answers, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    pub cache: DependencyHealth,
    pub search: DependencyHealth,
}

#[derive(Clone)]
pub struct HealthState {
    pub cache: Arc<CacheService>,
    pub store: Arc<dyn DocumentStore>,
}

pub fn routes(cache: Arc<CacheService>, store: Arc<dyn DocumentStore>) -> Router<()> {
    Router::new()
        .route("/", get(health))
        .with_state(HealthState { cache, store })
}

fn status_of<E: std::fmt::Display>(name: &str, result: Result<(), E>) -> &'static str {
    match result {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(dependency = name, error = %e, "Health check failed");
            "error"
        }
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is down", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let (cache, search) = tokio::join!(state.cache.health_check(), state.store.health_check());
    let cache = DependencyHealth {
        backend: state.cache.backend_name(),
        status: status_of("cache", cache),
    };
    let search = DependencyHealth {
        backend: state.store.backend_name(),
        status: status_of("search", search),
    };

    let healthy = cache.status == "ok" && search.status == "ok";
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            cache,
            search,
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::data::cache::tests::memory_cache;
    use crate::data::search::MemoryStore;

    #[tokio::test]
    async fn test_health_ok() {
        let app = routes(memory_cache().await, Arc::new(MemoryStore::new()));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache"]["backend"], "memory");
        assert_eq!(body["search"]["backend"], "memory");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
