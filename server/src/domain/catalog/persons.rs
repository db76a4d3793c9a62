//! Person queries

use std::sync::Arc;

use futures::future::try_join_all;
use uuid::Uuid;

use super::types::PersonDoc;
use super::{
    CatalogCache, CatalogError, FilmInPerson, FilmService, Pagination, PersonDetail, PersonShort,
    decode, paged, search_or_empty,
};
use crate::core::constants::INDEX_PERSONS;
use crate::data::cache::CacheKey;
use crate::data::search::{DocumentStore, Query, SearchRequest};

/// Persons with their filmography
///
/// Only the `PersonShort` part is cached under the person keys; films are
/// attached from the films-by-person cache on every call.
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn DocumentStore>,
    cache: CatalogCache,
    films: FilmService,
}

impl PersonService {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CatalogCache, films: FilmService) -> Self {
        Self {
            store,
            cache,
            films,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<PersonDetail, CatalogError> {
        let person = self
            .cache
            .cached(&CacheKey::person(id), move || async move {
                let request = SearchRequest::new(Query::Ids(vec![id.to_string()])).limit(1);
                let hit = search_or_empty(self.store.as_ref(), INDEX_PERSONS, &request)
                    .await?
                    .hits
                    .into_iter()
                    .next()
                    .ok_or(CatalogError::NotFound("Person"))?;
                decode::<PersonDoc>(INDEX_PERSONS, hit).map(PersonShort::from)
            })
            .await?;

        let films = self.films.films_by_person(id).await?;
        Ok(PersonDetail::new(person, films))
    }

    pub async fn search(
        &self,
        query: &str,
        page: Pagination,
    ) -> Result<Vec<PersonDetail>, CatalogError> {
        let key = paged(CacheKey::list("persons_search"), page)
            .param("query", Some(query))
            .build();

        let persons: Vec<PersonShort> = self
            .cache
            .cached(&key, move || async move {
                let request = SearchRequest::new(Query::multi_match(query, &["full_name"]))
                    .page(page.offset(), page.size());
                search_or_empty(self.store.as_ref(), INDEX_PERSONS, &request)
                    .await?
                    .hits
                    .into_iter()
                    .map(|hit| decode::<PersonDoc>(INDEX_PERSONS, hit).map(PersonShort::from))
                    .collect()
            })
            .await?;

        try_join_all(persons.into_iter().map(|person| async move {
            let films = self.films.films_by_person(person.uuid).await?;
            Ok::<_, CatalogError>(PersonDetail::new(person, films))
        }))
        .await
    }

    /// Films of a person; an unknown person has no films
    pub async fn films(&self, person_id: Uuid) -> Result<Vec<FilmInPerson>, CatalogError> {
        self.films.films_by_person(person_id).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::search::MemoryStore;
    use crate::domain::catalog::PersonRole;
    use crate::domain::catalog::tests::catalog_cache;

    async fn fixture() -> (PersonService, Uuid, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let (keanu, carrie) = (Uuid::new_v4(), Uuid::new_v4());
        let matrix = Uuid::new_v4();

        store.insert("persons", json!({"id": keanu, "full_name": "Keanu Reeves"}));
        store.insert("persons", json!({"id": carrie, "full_name": "Carrie-Anne Moss"}));
        store.insert(
            "movies",
            json!({
                "id": matrix, "title": "The Matrix", "imdb_rating": 8.7,
                "actors": [
                    {"id": keanu, "name": "Keanu Reeves"},
                    {"id": carrie, "name": "Carrie-Anne Moss"}
                ]
            }),
        );

        let (catalog, _) = catalog_cache().await;
        let films = FilmService::new(store.clone(), catalog.clone());
        (PersonService::new(store, catalog, films), keanu, matrix)
    }

    #[tokio::test]
    async fn test_get_by_id_attaches_films() {
        let (persons, keanu, matrix) = fixture().await;
        let person = persons.get_by_id(keanu).await.unwrap();
        assert_eq!(person.full_name, "Keanu Reeves");
        assert_eq!(person.films.len(), 1);
        assert_eq!(person.films[0].uuid, matrix);
        assert_eq!(person.films[0].roles, vec![PersonRole::Actor]);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (persons, _, _) = fixture().await;
        assert!(matches!(
            persons.get_by_id(Uuid::new_v4()).await,
            Err(CatalogError::NotFound("Person"))
        ));
    }

    #[tokio::test]
    async fn test_search_returns_details() {
        let (persons, keanu, _) = fixture().await;
        let found = persons.search("keanu", Pagination::default()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uuid, keanu);
        assert_eq!(found[0].films.len(), 1);

        let again = persons.search("keanu", Pagination::default()).await.unwrap();
        assert_eq!(again, found);
    }

    #[tokio::test]
    async fn test_films_for_unknown_person() {
        let (persons, _, _) = fixture().await;
        assert!(persons.films(Uuid::new_v4()).await.unwrap().is_empty());
    }
}
