//! Elasticsearch document store over the REST API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::SearchError;
use super::{DocumentStore, Query, SearchHit, SearchRequest, SearchResponse, SortOrder};

#[derive(Debug)]
pub struct ElasticsearchStore {
    client: reqwest::Client,
    url: String,
}

impl ElasticsearchStore {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {}", e)))?;

        let url = url.trim_end_matches('/').to_string();
        tracing::debug!(url = %url, timeout_secs, "Elasticsearch store initialized");
        Ok(Self { client, url })
    }
}

/// Render a query into the Elasticsearch query DSL
fn render_query(query: &Query) -> Value {
    match query {
        Query::MatchAll => json!({ "match_all": {} }),
        Query::Ids(ids) => json!({ "ids": { "values": ids } }),
        Query::MultiMatch { query, fields } => json!({
            "multi_match": { "query": query, "fields": fields }
        }),
        Query::Nested { path, query } => json!({
            "nested": { "path": path, "query": render_query(query) }
        }),
        Query::AnyOf(queries) => json!({
            "bool": {
                "should": queries.iter().map(render_query).collect::<Vec<_>>(),
                "minimum_should_match": 1
            }
        }),
    }
}

fn render_request(request: &SearchRequest) -> Value {
    let mut body = json!({ "query": render_query(&request.query) });
    if !request.sort.is_empty() {
        body["sort"] = request
            .sort
            .iter()
            .map(|s| {
                let order = match s.order {
                    SortOrder::Asc => "asc",
                    SortOrder::Desc => "desc",
                };
                let mut clause = serde_json::Map::new();
                clause.insert(
                    s.field.clone(),
                    json!({ "order": order, "missing": "_last" }),
                );
                Value::Object(clause)
            })
            .collect();
    }
    if let Some(from) = request.from {
        body["from"] = json!(from);
    }
    if let Some(size) = request.size {
        body["size"] = json!(size);
    }
    body
}

#[derive(Deserialize)]
struct RawResponse {
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    total: Option<RawTotal>,
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawTotal {
    value: u64,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl From<RawResponse> for SearchResponse {
    fn from(raw: RawResponse) -> Self {
        let hits: Vec<SearchHit> = raw
            .hits
            .hits
            .into_iter()
            .map(|h| SearchHit {
                id: h.id,
                score: h.score,
                source: h.source,
            })
            .collect();
        Self {
            total: raw.hits.total.map_or(hits.len() as u64, |t| t.value),
            hits,
        }
    }
}

/// Whether an error body reports a missing index
fn is_index_not_found(body: &Value) -> bool {
    body["error"]["type"].as_str() == Some("index_not_found_exception")
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn search(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, SearchError> {
        let url = format!("{}/{}/_search", self.url, index);
        let body = render_request(request);
        tracing::debug!(index, query = %body, "Elasticsearch search");

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            if status == reqwest::StatusCode::NOT_FOUND && is_index_not_found(&body) {
                return Err(SearchError::IndexNotFound(index.to_string()));
            }
            let reason = body["error"]["reason"]
                .as_str()
                .unwrap_or("unexpected response")
                .to_string();
            return Err(SearchError::status(status, reason));
        }

        let raw: RawResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;
        Ok(raw.into())
    }

    async fn health_check(&self) -> Result<(), SearchError> {
        let url = format!("{}/_cluster/health", self.url);
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(SearchError::status(resp.status(), "cluster health check failed"));
        }

        let body: Value = resp.json().await?;
        if body["status"].as_str() == Some("red") {
            return Err(SearchError::Status {
                status: 503,
                message: "cluster status is red".to_string(),
            });
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "elasticsearch"
    }
}
