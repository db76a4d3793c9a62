//! Genre queries

use std::sync::Arc;

use uuid::Uuid;

use super::types::GenreDoc;
use super::{CatalogCache, CatalogError, GenreShort, Pagination, decode, paged, search_or_empty};
use crate::core::constants::INDEX_GENRES;
use crate::data::cache::CacheKey;
use crate::data::search::{DocumentStore, Query, SearchRequest};

#[derive(Clone)]
pub struct GenreService {
    store: Arc<dyn DocumentStore>,
    cache: CatalogCache,
}

impl GenreService {
    pub fn new(store: Arc<dyn DocumentStore>, cache: CatalogCache) -> Self {
        Self { store, cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<GenreShort, CatalogError> {
        self.cache
            .cached(&CacheKey::genre(id), move || async move {
                let request = SearchRequest::new(Query::Ids(vec![id.to_string()])).limit(1);
                let hit = search_or_empty(self.store.as_ref(), INDEX_GENRES, &request)
                    .await?
                    .hits
                    .into_iter()
                    .next()
                    .ok_or(CatalogError::NotFound("Genre"))?;
                decode::<GenreDoc>(INDEX_GENRES, hit).map(GenreShort::from)
            })
            .await
    }

    pub async fn list(&self, page: Pagination) -> Result<Vec<GenreShort>, CatalogError> {
        let key = paged(CacheKey::list("genres"), page).build();

        self.cache
            .cached(&key, move || async move {
                let request = SearchRequest::new(Query::MatchAll).page(page.offset(), page.size());
                search_or_empty(self.store.as_ref(), INDEX_GENRES, &request)
                    .await?
                    .hits
                    .into_iter()
                    .map(|hit| decode::<GenreDoc>(INDEX_GENRES, hit).map(GenreShort::from))
                    .collect()
            })
            .await
    }
}
