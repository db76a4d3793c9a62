//! Genre endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::extractors::{IdPath, ValidatedQuery};
use crate::api::types::{ApiError, PageQuery};
use crate::domain::GenreService;
use crate::domain::catalog::GenreShort;

#[derive(Clone)]
pub struct GenresApiState {
    pub genres: GenreService,
}

pub fn routes(genres: GenreService) -> Router<()> {
    Router::new()
        .route("/", get(list_genres))
        .route("/{id}", get(get_genre))
        .with_state(GenresApiState { genres })
}

/// List genres
#[utoipa::path(
    get,
    path = "/api/v1/genres",
    tag = "genres",
    params(PageQuery),
    responses(
        (status = 200, description = "Genres", body = Vec<GenreShort>)
    )
)]
pub async fn list_genres(
    State(state): State<GenresApiState>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> Result<Json<Vec<GenreShort>>, ApiError> {
    Ok(Json(state.genres.list(page.into()).await?))
}

/// Genre by id
#[utoipa::path(
    get,
    path = "/api/v1/genres/{id}",
    tag = "genres",
    params(("id" = uuid::Uuid, Path, description = "Genre id")),
    responses(
        (status = 200, description = "Genre", body = GenreShort),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<GenresApiState>,
    IdPath(id): IdPath,
) -> Result<Json<GenreShort>, ApiError> {
    Ok(Json(state.genres.get_by_id(id).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::data::search::MemoryStore;
    use crate::domain::catalog::tests::catalog_cache;

    async fn status_of(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_genre_routes() {
        let store = Arc::new(MemoryStore::new());
        let drama = Uuid::new_v4();
        store.insert("genres", json!({"id": drama, "name": "Drama"}));
        let (catalog, _) = catalog_cache().await;
        let app = routes(GenreService::new(store, catalog));

        assert_eq!(status_of(app.clone(), "/").await, StatusCode::OK);
        assert_eq!(status_of(app.clone(), &format!("/{drama}")).await, StatusCode::OK);
        assert_eq!(
            status_of(app.clone(), &format!("/{}", Uuid::new_v4())).await,
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(app, "/not-a-uuid").await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_index_lists_empty() {
        let (catalog, _) = catalog_cache().await;
        let app = routes(GenreService::new(Arc::new(MemoryStore::new()), catalog));
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"[]");
    }
}
