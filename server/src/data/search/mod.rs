//! Document store module
//!
//! Read-only access to denormalized JSON documents (films, genres, persons)
//! through a small query algebra. Backends:
//! - Elasticsearch over HTTP (default)
//! - In-process memory store for tests and local development

mod elastic;
mod error;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;

pub use elastic::ElasticsearchStore;
pub use error::SearchError;
pub use memory::MemoryStore;

use crate::core::config::{SearchBackendType, SearchConfig};

/// Query algebra understood by every backend
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    MatchAll,
    /// Exact document id match
    Ids(Vec<String>),
    /// Full-text match of `query` against any of `fields`
    MultiMatch { query: String, fields: Vec<String> },
    /// Match `query` inside the sub-documents under `path`
    Nested { path: String, query: Box<Query> },
    /// Logical OR, at least one branch must match
    AnyOf(Vec<Query>),
}

impl Query {
    pub fn multi_match(query: impl Into<String>, fields: &[&str]) -> Self {
        Self::MultiMatch {
            query: query.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Nested match of `value` on `{path}.{field}`
    pub fn nested(path: &str, field: &str, value: impl Into<String>) -> Self {
        Self::Nested {
            path: path.to_string(),
            query: Box::new(Self::multi_match(value, &[&format!("{path}.{field}")])),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            order: SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Query,
    pub sort: Vec<SortField>,
    pub from: Option<u64>,
    pub size: Option<u64>,
}

impl SearchRequest {
    pub fn new(query: Query) -> Self {
        Self {
            query,
            sort: Vec::new(),
            from: None,
            size: None,
        }
    }

    pub fn sort(mut self, sort: SortField) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn page(mut self, from: u64, size: u64) -> Self {
        self.from = Some(from);
        self.size = Some(size);
        self
    }

    pub fn limit(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: Option<f64>,
    pub source: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<SearchHit>,
}

/// Read side of a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError>;

    async fn health_check(&self) -> Result<(), SearchError>;

    fn backend_name(&self) -> &'static str;
}

/// Build the configured document store
pub async fn create_store(config: &SearchConfig) -> Result<Arc<dyn DocumentStore>, SearchError> {
    match config.backend {
        SearchBackendType::Elasticsearch => {
            let store = ElasticsearchStore::new(&config.url, config.timeout_secs)?;
            if let Err(e) = store.health_check().await {
                tracing::warn!(url = %config.url, error = %e, "Elasticsearch not reachable at startup");
            }
            Ok(Arc::new(store))
        }
        SearchBackendType::Memory => {
            let store = match &config.seed_path {
                Some(path) => MemoryStore::from_seed_file(path).await?,
                None => MemoryStore::new(),
            };
            tracing::debug!(seeded = config.seed_path.is_some(), "Initializing memory document store");
            Ok(Arc::new(store))
        }
    }
}
