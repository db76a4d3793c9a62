//! In-process document store
//!
//! Evaluates the query algebra over JSON documents held in memory.
//! Multi-match is case-insensitive token matching, where a document matches
//! when any query token equals a token of any listed field.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::error::SearchError;
use super::{DocumentStore, Query, SearchHit, SearchRequest, SearchResponse, SortField, SortOrder};

#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{ "<index>": [ {doc}, ... ], ... }` from a JSON file
    pub async fn from_seed_file(path: &Path) -> Result<Self, SearchError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SearchError::Config(format!("failed to read seed file {}: {}", path.display(), e))
        })?;
        let indices: HashMap<String, Vec<Value>> = serde_json::from_str(&content).map_err(|e| {
            SearchError::Config(format!("invalid seed file {}: {}", path.display(), e))
        })?;

        let store = Self::new();
        for (index, docs) in indices {
            tracing::debug!(index = %index, count = docs.len(), "Seeding memory index");
            for doc in docs {
                store.insert(&index, doc);
            }
        }
        Ok(store)
    }

    /// Add a document; creates the index on first use
    pub fn insert(&self, index: &str, doc: Value) {
        self.indices
            .write()
            .entry(index.to_string())
            .or_default()
            .push(doc);
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Collect the scalar values at a dotted path, descending through arrays
fn values_at<'a>(doc: &'a Value, path: &str, out: &mut Vec<&'a Value>) {
    match doc {
        Value::Array(items) => items.iter().for_each(|item| values_at(item, path, out)),
        _ => match path.split_once('.') {
            Some((head, rest)) => {
                if let Some(child) = doc.get(head) {
                    values_at(child, rest, out);
                }
            }
            None => match doc.get(path) {
                Some(Value::Array(items)) => out.extend(items.iter()),
                Some(value) => out.push(value),
                None => {}
            },
        },
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Relevance of `doc` for `query`, `None` when it does not match
fn score(doc: &Value, query: &Query) -> Option<f64> {
    match query {
        Query::MatchAll => Some(1.0),
        Query::Ids(ids) => {
            let id = doc.get("id").and_then(Value::as_str)?;
            ids.iter().any(|candidate| candidate == id).then_some(1.0)
        }
        Query::MultiMatch { query, fields } => {
            let wanted = tokenize(query);
            let mut found = Vec::new();
            for field in fields {
                values_at(doc, field, &mut found);
            }
            let tokens: Vec<String> = found
                .into_iter()
                .filter_map(value_text)
                .flat_map(|text| tokenize(&text))
                .collect();
            let hits = wanted.iter().filter(|w| tokens.contains(w)).count();
            (hits > 0).then_some(hits as f64)
        }
        Query::Nested { path, query } => {
            let mut children = Vec::new();
            if let Some(value) = doc.get(path.as_str()) {
                match value {
                    Value::Array(items) => children.extend(items.iter()),
                    other => children.push(other),
                }
            }
            children
                .into_iter()
                .filter_map(|child| {
                    let mut wrapper = serde_json::Map::new();
                    wrapper.insert(path.clone(), child.clone());
                    score(&Value::Object(wrapper), query)
                })
                .reduce(f64::max)
        }
        Query::AnyOf(queries) => queries
            .iter()
            .filter_map(|q| score(doc, q))
            .reduce(|a, b| a + b),
    }
}

/// Sortable value of one document field
#[derive(PartialEq, PartialOrd)]
enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

/// Value `field` sorts on; a keyword subfield (`title.raw`) sorts on its parent's value
fn sort_key<'a>(doc: &'a Value, field: &str) -> Option<SortKey<'a>> {
    let field = field.strip_suffix(".raw").unwrap_or(field);
    match doc.get(field)? {
        Value::Number(n) => n.as_f64().map(SortKey::Number),
        Value::String(s) => Some(SortKey::Text(s)),
        _ => None,
    }
}

/// Sort with missing values last in either direction
fn compare(a: &Value, b: &Value, sort: &SortField) -> Ordering {
    match (sort_key(a, &sort.field), sort_key(b, &sort.field)) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match sort.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let indices = self.indices.read();
        let docs = indices
            .get(index)
            .ok_or_else(|| SearchError::IndexNotFound(index.to_string()))?;

        let mut matched: Vec<(f64, &Value)> = docs
            .iter()
            .filter_map(|doc| score(doc, &request.query).map(|s| (s, doc)))
            .collect();

        if request.sort.is_empty() {
            matched.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        } else {
            matched.sort_by(|a, b| {
                request
                    .sort
                    .iter()
                    .map(|s| compare(a.1, b.1, s))
                    .find(|o| o.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let total = matched.len() as u64;
        let from = request.from.unwrap_or(0) as usize;
        let size = request.size.unwrap_or(10) as usize;

        let hits = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(score, doc)| SearchHit {
                id: doc
                    .get("id")
                    .and_then(value_text)
                    .unwrap_or_default(),
                score: request.sort.is_empty().then_some(score),
                source: doc.clone(),
            })
            .collect();

        Ok(SearchResponse { total, hits })
    }

    async fn health_check(&self) -> Result<(), SearchError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            "movies",
            json!({
                "id": "f1", "title": "The Matrix", "imdb_rating": 8.7,
                "genres": [{"id": "g-action", "name": "Action"}],
                "actors": [{"id": "p-neo", "name": "Keanu Reeves"}],
                "directors": [], "writers": []
            }),
        );
        store.insert(
            "movies",
            json!({
                "id": "f2", "title": "Matrix Reloaded", "imdb_rating": 7.2,
                "genres": [{"id": "g-scifi", "name": "Sci-Fi"}],
                "actors": [], "directors": [], "writers": [{"id": "p-neo", "name": "Keanu Reeves"}]
            }),
        );
        store.insert(
            "movies",
            json!({
                "id": "f3", "title": "Unrated", "imdb_rating": null,
                "genres": [], "actors": [], "directors": [], "writers": []
            }),
        );
        store
    }

    fn ids(response: &SearchResponse) -> Vec<&str> {
        response.hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_sort_desc_nulls_last() {
        let request = SearchRequest::new(Query::MatchAll).sort(SortField::desc("imdb_rating"));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f1", "f2", "f3"]);
        assert_eq!(response.total, 3);
    }

    #[tokio::test]
    async fn test_sort_asc_nulls_last() {
        let request = SearchRequest::new(Query::MatchAll).sort(SortField {
            field: "imdb_rating".into(),
            order: SortOrder::Asc,
        });
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f2", "f1", "f3"]);
    }

    #[tokio::test]
    async fn test_sort_by_title_keyword() {
        let request = SearchRequest::new(Query::MatchAll).sort(SortField {
            field: "title.raw".into(),
            order: SortOrder::Asc,
        });
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f2", "f1", "f3"]);

        let request = SearchRequest::new(Query::MatchAll).sort(SortField::desc("title.raw"));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f3", "f1", "f2"]);
    }

    #[tokio::test]
    async fn test_multi_match_case_insensitive() {
        let request = SearchRequest::new(Query::multi_match("matrix", &["title"]));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(response.total, 2);
    }

    #[tokio::test]
    async fn test_nested_match() {
        let request = SearchRequest::new(Query::nested("genres", "id", "g-scifi"));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f2"]);
    }

    #[tokio::test]
    async fn test_any_of() {
        let request = SearchRequest::new(Query::AnyOf(vec![
            Query::nested("actors", "id", "p-neo"),
            Query::nested("writers", "id", "p-neo"),
        ]))
        .sort(SortField::desc("imdb_rating"));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f1", "f2"]);
    }

    #[tokio::test]
    async fn test_ids_and_paging() {
        let request = SearchRequest::new(Query::Ids(vec!["f3".into()]));
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f3"]);

        let request = SearchRequest::new(Query::MatchAll)
            .sort(SortField::desc("imdb_rating"))
            .page(1, 1);
        let response = store().search("movies", &request).await.unwrap();
        assert_eq!(ids(&response), vec!["f2"]);
        assert_eq!(response.total, 3);
    }

    #[tokio::test]
    async fn test_missing_index() {
        let err = MemoryStore::new()
            .search("genres", &SearchRequest::new(Query::MatchAll))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::IndexNotFound(index) if index == "genres"));
    }

    #[tokio::test]
    async fn test_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"genres": [{"id": "g1", "name": "Drama"}]}"#,
        )
        .unwrap();

        let store = MemoryStore::from_seed_file(file.path()).await.unwrap();
        let response = store
            .search("genres", &SearchRequest::new(Query::MatchAll))
            .await
            .unwrap();
        assert_eq!(response.hits[0].source["name"], "Drama");
    }
}
