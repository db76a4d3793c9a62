//! Catalog read services
//!
//! Films, genres and persons are served from the document store through a
//! cache-aside layer. Every miss is resolved against the store and written
//! back once with the uniform catalog TTL; entries are never invalidated
//! by upstream writes.

mod films;
mod genres;
mod persons;
pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use films::FilmService;
pub use genres::GenreService;
pub use persons::PersonService;
pub use types::{
    FilmDetail, FilmInPerson, FilmShort, FilmSort, GenreShort, Pagination, PersonDetail,
    PersonRole, PersonShort,
};

use crate::data::cache::{CacheError, CacheService, ListKey};
use crate::data::search::{DocumentStore, SearchError, SearchHit, SearchRequest, SearchResponse};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid sort field: {0}")]
    InvalidSort(String),

    #[error("Malformed document in index {index}: {message}")]
    Document { index: String, message: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Read-through helper shared by the catalog services
#[derive(Clone)]
pub struct CatalogCache {
    cache: Arc<CacheService>,
    ttl: Duration,
}

impl CatalogCache {
    pub fn new(cache: Arc<CacheService>) -> Self {
        let ttl = cache.default_ttl();
        Self { cache, ttl }
    }

    /// Return the cached value under `key`, or run `load` and store its result
    ///
    /// Errors from `load` are returned as-is and nothing is written.
    pub async fn cached<T, F, Fut>(&self, key: &str, load: F) -> Result<T, CatalogError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        if let Some(value) = self.cache.get::<T>(key).await? {
            tracing::trace!(key, "Catalog cache hit");
            return Ok(value);
        }

        tracing::debug!(key, "Catalog cache miss");
        let value = load().await?;
        self.cache.set(key, &value, Some(self.ttl)).await?;
        Ok(value)
    }
}

/// Run a search, treating a missing index as an empty result
pub(crate) async fn search_or_empty(
    store: &dyn DocumentStore,
    index: &str,
    request: &SearchRequest,
) -> Result<SearchResponse, CatalogError> {
    match store.search(index, request).await {
        Ok(response) => Ok(response),
        Err(SearchError::IndexNotFound(index)) => {
            tracing::warn!(%index, "Index not found, returning empty result");
            Ok(SearchResponse::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Deserialize the source document of a hit
pub(crate) fn decode<T: DeserializeOwned>(index: &str, hit: SearchHit) -> Result<T, CatalogError> {
    serde_json::from_value(hit.source).map_err(|e| CatalogError::Document {
        index: index.to_string(),
        message: format!("hit {}: {}", hit.id, e),
    })
}

/// Append pagination parameters to a list key
pub(crate) fn paged(key: ListKey, page: Pagination) -> ListKey {
    key.param("page", Some(&page.page.to_string()))
        .param("page_size", Some(&page.page_size.to_string()))
}
