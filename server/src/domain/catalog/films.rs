//! Film queries

use std::sync::Arc;

use uuid::Uuid;

use super::types::FilmDoc;
use super::{
    CatalogCache, CatalogError, FilmDetail, FilmInPerson, FilmShort, FilmSort, Pagination, decode,
    paged, search_or_empty,
};
use crate::core::constants::{INDEX_FILMS, PERSON_FILMS_LIMIT};
use crate::data::cache::CacheKey;
use crate::data::search::{DocumentStore, Query, SearchRequest, SortField};

/// Nested person lists of a film document
const PERSON_PATHS: [&str; 3] = ["actors", "directors", "writers"];

#[derive(Clone)]
pub struct FilmService {
    store: Arc<dyn DocumentStore>,
    cache: CatalogCache,
}

impl FilmService {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CatalogCache) -> Self {
        Self { store, cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<FilmDetail, CatalogError> {
        self.cache
            .cached(&CacheKey::film(id), move || async move {
                let request = SearchRequest::new(Query::Ids(vec![id.to_string()])).limit(1);
                let hit = search_or_empty(self.store.as_ref(), INDEX_FILMS, &request)
                    .await?
                    .hits
                    .into_iter()
                    .next()
                    .ok_or(CatalogError::NotFound("Film"))?;
                let doc: FilmDoc = decode(INDEX_FILMS, hit)?;
                Ok(FilmDetail::from(doc))
            })
            .await
    }

    /// Films ordered by `sort`, optionally restricted to one genre
    pub async fn list(
        &self,
        sort: &FilmSort,
        page: Pagination,
        genre_id: Option<Uuid>,
    ) -> Result<Vec<FilmShort>, CatalogError> {
        let genre = genre_id.map(|g| g.to_string());
        let key = paged(CacheKey::list("films"), page)
            .param("sort", Some(&sort.as_param()))
            .param("genre_id", genre.as_deref())
            .build();

        self.cache
            .cached(&key, move || async move {
                let query = match genre {
                    Some(genre) => Query::nested("genres", "id", genre),
                    None => Query::MatchAll,
                };
                let request = SearchRequest::new(query)
                    .sort(sort.to_sort_field())
                    .page(page.offset(), page.size());
                self.fetch_short(&request).await
            })
            .await
    }

    /// Full-text search on titles, best rated first
    pub async fn search(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<FilmShort>, CatalogError> {
        let key = paged(CacheKey::list("films_search"), page)
            .param("query", Some(query))
            .build();

        self.cache
            .cached(&key, move || async move {
                let request = SearchRequest::new(Query::multi_match(query, &["title"]))
                    .sort(SortField::desc("imdb_rating"))
                    .page(page.offset(), page.size());
                self.fetch_short(&request).await
            })
            .await
    }

    /// Films a person took part in, with the roles they played
    pub async fn films_by_person(&self, person_id: Uuid) -> Result<Vec<FilmInPerson>, CatalogError> {
        self.cache
            .cached(&CacheKey::person_films(person_id), move || async move {
                let id = person_id.to_string();
                let query = Query::AnyOf(
                    PERSON_PATHS
                        .iter()
                        .map(|path| Query::nested(path, "id", id.clone()))
                        .collect(),
                );
                let request = SearchRequest::new(query)
                    .sort(SortField::desc("imdb_rating"))
                    .limit(PERSON_FILMS_LIMIT);

                let response = search_or_empty(self.store.as_ref(), INDEX_FILMS, &request).await?;
                response
                    .hits
                    .into_iter()
                    .map(|hit| {
                        let doc: FilmDoc = decode(INDEX_FILMS, hit)?;
                        Ok(FilmInPerson {
                            uuid: doc.id,
                            roles: doc.roles_of(person_id),
                        })
                    })
                    .collect()
            })
            .await
    }

    async fn fetch_short(&self, request: &SearchRequest) -> Result<Vec<FilmShort>, CatalogError> {
        let response = search_or_empty(self.store.as_ref(), INDEX_FILMS, request).await?;
        response
            .hits
            .into_iter()
            .map(|hit| decode::<FilmDoc>(INDEX_FILMS, hit).map(FilmShort::from))
            .collect()
    }
}
