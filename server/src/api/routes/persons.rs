//! Person endpoints

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use super::films::SearchQuery;
use crate::api::extractors::{IdPath, ValidatedQuery};
use crate::api::types::ApiError;
use crate::domain::PersonService;
use crate::domain::catalog::{FilmInPerson, Pagination, PersonDetail};

#[derive(Clone)]
pub struct PersonsApiState {
    pub persons: PersonService,
}

pub fn routes(persons: PersonService) -> Router<()> {
    Router::new()
        .route("/search", get(search_persons))
        .route("/{id}", get(get_person))
        .route("/{id}/film", get(person_films))
        .with_state(PersonsApiState { persons })
}

/// Search persons by name
#[utoipa::path(
    get,
    path = "/api/v1/persons/search",
    tag = "persons",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching persons with films", body = Vec<PersonDetail>)
    )
)]
pub async fn search_persons(
    State(state): State<PersonsApiState>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<Vec<PersonDetail>>, ApiError> {
    let page = Pagination::new(query.page, query.page_size);
    Ok(Json(state.persons.search(&query.query, page).await?))
}

/// Person with filmography
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}",
    tag = "persons",
    params(("id" = uuid::Uuid, Path, description = "Person id")),
    responses(
        (status = 200, description = "Person", body = PersonDetail),
        (status = 404, description = "Person not found")
    )
)]
pub async fn get_person(
    State(state): State<PersonsApiState>,
    IdPath(id): IdPath,
) -> Result<Json<PersonDetail>, ApiError> {
    Ok(Json(state.persons.get_by_id(id).await?))
}

/// Films of a person with the roles played
#[utoipa::path(
    get,
    path = "/api/v1/persons/{id}/film",
    tag = "persons",
    params(("id" = uuid::Uuid, Path, description = "Person id")),
    responses(
        (status = 200, description = "Films; empty for an unknown person", body = Vec<FilmInPerson>)
    )
)]
pub async fn person_films(
    State(state): State<PersonsApiState>,
    IdPath(id): IdPath,
) -> Result<Json<Vec<FilmInPerson>>, ApiError> {
    Ok(Json(state.persons.films(id).await?))
}
