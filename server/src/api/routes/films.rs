//! Film endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{IdPath, ValidatedQuery};
use crate::api::types::{
    ApiError, default_page, default_page_size, validate_page, validate_page_size,
};
use crate::domain::catalog::{FilmDetail, FilmShort, FilmSort, Pagination};
use crate::domain::FilmService;

#[derive(Clone)]
pub struct FilmsApiState {
    pub films: FilmService,
}

pub fn routes(films: FilmService) -> Router<()> {
    Router::new()
        .route("/", get(list_films))
        .route("/search", get(search_films))
        .route("/{id}", get(get_film))
        .with_state(FilmsApiState { films })
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListFilmsQuery {
    /// `imdb_rating` or `title`, `-` prefix for descending
    pub sort: Option<String>,
    /// Only films of this genre
    pub genre_id: Option<Uuid>,
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(custom(function = "validate_page_size"))]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 256, message = "query must be 1-256 characters"))]
    pub query: String,
    #[serde(default = "default_page")]
    #[validate(custom(function = "validate_page"))]
    pub page: u32,
    #[serde(default = "default_page_size")]
    #[validate(custom(function = "validate_page_size"))]
    pub page_size: u32,
}

/// List films
#[utoipa::path(
    get,
    path = "/api/v1/films",
    tag = "films",
    params(ListFilmsQuery),
    responses(
        (status = 200, description = "Films in the requested order", body = Vec<FilmShort>),
        (status = 400, description = "Invalid sort or pagination")
    )
)]
pub async fn list_films(
    State(state): State<FilmsApiState>,
    ValidatedQuery(query): ValidatedQuery<ListFilmsQuery>,
) -> Result<Json<Vec<FilmShort>>, ApiError> {
    let sort = match query.sort.as_deref() {
        Some(raw) => FilmSort::parse(raw)?,
        None => FilmSort::default(),
    };
    let page = Pagination::new(query.page, query.page_size);
    let films = state.films.list(&sort, page, query.genre_id).await?;
    Ok(Json(films))
}

/// Full-text search on film titles
#[utoipa::path(
    get,
    path = "/api/v1/films/search",
    tag = "films",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching films", body = Vec<FilmShort>)
    )
)]
pub async fn search_films(
    State(state): State<FilmsApiState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<Vec<FilmShort>>, ApiError> {
    let page = Pagination::new(query.page, query.page_size);
    let films = state.films.search(&query.query, page).await?;
    Ok(Json(films))
}

/// Film details
#[utoipa::path(
    get,
    path = "/api/v1/films/{id}",
    tag = "films",
    params(("id" = Uuid, Path, description = "Film id")),
    responses(
        (status = 200, description = "Film details", body = FilmDetail),
        (status = 404, description = "Film not found")
    )
)]
pub async fn get_film(
    State(state): State<FilmsApiState>,
    IdPath(id): IdPath,
) -> Result<Json<FilmDetail>, ApiError> {
    Ok(Json(state.films.get_by_id(id).await?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::data::search::MemoryStore;
    use crate::domain::catalog::tests::catalog_cache;

    async fn app() -> (Router, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let (drama, matrix) = (Uuid::new_v4(), Uuid::new_v4());
        store.insert(
            "movies",
            json!({
                "id": matrix, "title": "The Matrix", "imdb_rating": 8.7,
                "genres": [{"id": drama, "name": "Drama"}]
            }),
        );
        store.insert(
            "movies",
            json!({"id": Uuid::new_v4(), "title": "Cats", "imdb_rating": 2.8}),
        );
        let (catalog, _) = catalog_cache().await;
        (routes(FilmService::new(store, catalog)), drama, matrix)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_list_default_sort() {
        let (app, _, _) = app().await;
        let (status, body) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "The Matrix");
        assert_eq!(body[1]["title"], "Cats");
    }

    #[tokio::test]
    async fn test_list_ascending_and_genre() {
        let (app, drama, _) = app().await;
        let (_, body) = get_json(app.clone(), "/?sort=imdb_rating").await;
        assert_eq!(body[0]["title"], "Cats");

        let (_, body) = get_json(app, &format!("/?genre_id={drama}")).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted_by_title() {
        let (app, _, _) = app().await;
        let (status, body) = get_json(app.clone(), "/?sort=title").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["title"], "Cats");
        assert_eq!(body[1]["title"], "The Matrix");

        let (_, body) = get_json(app, "/?sort=-title").await;
        assert_eq!(body[0]["title"], "The Matrix");
    }

    #[tokio::test]
    async fn test_invalid_sort_is_400() {
        let (app, _, _) = app().await;
        let (status, body) = get_json(app, "/?sort=description").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_SORT");
    }

    #[tokio::test]
    async fn test_page_size_limit() {
        let (app, _, _) = app().await;
        let (status, _) = get_json(app, "/?page_size=1000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_and_detail() {
        let (app, _, matrix) = app().await;
        let (status, body) = get_json(app.clone(), "/search?query=matrix").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["uuid"], matrix.to_string());

        let (status, body) = get_json(app.clone(), &format!("/{matrix}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["genres"][0]["name"], "Drama");

        let (status, _) = get_json(app, &format!("/{}", Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
