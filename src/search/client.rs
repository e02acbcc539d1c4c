//! Search engine seam and the Elasticsearch HTTP client

use crate::search::config::SearchConfig;
use crate::search::document::ProductDocument;
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Longest engine error body carried into an error message
const MAX_ERROR_BODY: usize = 512;

/// Ids fetched per scroll page when listing an index
const SCROLL_PAGE_SIZE: usize = 1000;

/// How long the engine keeps a scroll context alive between pages
const SCROLL_KEEP_ALIVE: &str = "1m";

/// Outcome of a single-document delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Operations the search subsystem needs from a full-text engine.
///
/// Implementations are injected into every component so tests can swap the
/// HTTP client for an in-memory fake.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Whether the index exists
    async fn index_exists(&self, index: &str) -> SearchResult<bool>;

    /// Create the index with the given settings and mappings
    async fn create_index(&self, index: &str, definition: &Value) -> SearchResult<()>;

    /// Create or overwrite a document; `refresh` makes it searchable immediately
    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
        refresh: bool,
    ) -> SearchResult<()>;

    /// Delete a document by id
    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<DeleteOutcome>;

    /// Ids of every document currently in the index
    async fn document_ids(&self, index: &str) -> SearchResult<Vec<String>>;

    /// Delete the documents with the given ids, returning how many went away
    async fn delete_documents(&self, index: &str, ids: &[String]) -> SearchResult<u64>;

    /// Execute a native query body
    async fn search(&self, index: &str, body: &Value) -> SearchResult<RawSearchResponse>;
}

/// Engine search response, limited to the parts the gateway reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResponse {
    #[serde(default)]
    pub hits: RawHits,

    #[serde(default)]
    pub suggest: HashMap<String, Vec<RawSuggestEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHits {
    #[serde(default)]
    pub total: TotalHits,

    #[serde(default)]
    pub hits: Vec<RawHit>,
}

/// Total hit count; older engines report a bare number
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object { value: u64 },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) | TotalHits::Object { value } => *value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Count(0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_score", default)]
    pub score: Option<f64>,

    #[serde(rename = "_source", default)]
    pub source: Option<ProductDocument>,

    #[serde(default)]
    pub highlight: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSuggestEntry {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub options: Vec<RawSuggestOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSuggestOption {
    pub text: String,

    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct DeleteByQueryResponse {
    #[serde(default)]
    deleted: u64,
}

#[derive(Debug, Deserialize)]
struct ScrollPage {
    #[serde(rename = "_scroll_id", default)]
    scroll_id: Option<String>,

    #[serde(default)]
    hits: ScrollHits,
}

#[derive(Debug, Default, Deserialize)]
struct ScrollHits {
    #[serde(default)]
    hits: Vec<ScrollHit>,
}

#[derive(Debug, Deserialize)]
struct ScrollHit {
    #[serde(rename = "_id")]
    id: String,
}

/// Elasticsearch REST client
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
    timeout_secs: u64,
}

impl ElasticsearchClient {
    /// Build a client with a bounded per-request timeout
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        if config.node_url.trim().is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "search node URL is empty".to_string(),
            ));
        }
        if config.request_timeout_secs == 0 {
            return Err(SearchError::InvalidConfiguration(
                "search request timeout must be at least one second".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), password) => Some((user.clone(), password.clone().unwrap_or_default())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url: config.node_url.trim_end_matches('/').to_string(),
            credentials,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some((user, password)) => builder.basic_auth(user, Some(password)),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> SearchResult<reqwest::Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout(self.timeout_secs)
            } else {
                SearchError::Transport(e.to_string())
            }
        })
    }

    async fn scroll_page(&self, builder: RequestBuilder) -> SearchResult<ScrollPage> {
        let response = self.send(builder).await?;
        if !response.status().is_success() {
            return Err(SearchError::SearchFailed(
                Self::describe_failure(response).await,
            ));
        }
        response
            .json::<ScrollPage>()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    async fn clear_scroll(&self, scroll_id: &str) {
        let result = self
            .send(
                self.request(Method::DELETE, "_search/scroll")
                    .json(&json!({ "scroll_id": scroll_id })),
            )
            .await;
        if let Err(e) = result {
            debug!(error = %e, "Failed to clear scroll context");
        }
    }

    async fn describe_failure(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("{} {}", status, truncate(&body, MAX_ERROR_BODY))
    }
}

#[async_trait]
impl SearchEngine for ElasticsearchClient {
    async fn index_exists(&self, index: &str) -> SearchResult<bool> {
        let response = self.send(self.request(Method::HEAD, index)).await?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(SearchError::IndexInitFailed(
                Self::describe_failure(response).await,
            )),
        }
    }

    async fn create_index(&self, index: &str, definition: &Value) -> SearchResult<()> {
        let response = self
            .send(self.request(Method::PUT, index).json(definition))
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let detail = Self::describe_failure(response).await;
        // Another process created it between our existence check and this call
        if detail.contains("resource_already_exists_exception") {
            debug!(index = %index, "Index created concurrently");
            return Ok(());
        }
        Err(SearchError::IndexInitFailed(detail))
    }

    async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
        refresh: bool,
    ) -> SearchResult<()> {
        let refresh = if refresh { "true" } else { "false" };
        let response = self
            .send(
                self.request(Method::PUT, &format!("{}/_doc/{}", index, id))
                    .query(&[("refresh", refresh)])
                    .json(document),
            )
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SearchError::IndexingFailed(
                Self::describe_failure(response).await,
            ))
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> SearchResult<DeleteOutcome> {
        let response = self
            .send(
                self.request(Method::DELETE, &format!("{}/_doc/{}", index, id))
                    .query(&[("refresh", "true")]),
            )
            .await?;

        match response.status() {
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => Ok(DeleteOutcome::NotFound),
            _ => Err(SearchError::DeletionFailed(
                Self::describe_failure(response).await,
            )),
        }
    }

    async fn document_ids(&self, index: &str) -> SearchResult<Vec<String>> {
        let body = json!({
            "_source": false,
            "size": SCROLL_PAGE_SIZE,
            "sort": ["_doc"],
            "query": { "match_all": {} }
        });

        let mut page = self
            .scroll_page(
                self.request(Method::POST, &format!("{}/_search", index))
                    .query(&[("scroll", SCROLL_KEEP_ALIVE)])
                    .json(&body),
            )
            .await?;

        let mut ids = Vec::new();
        loop {
            let fetched = page.hits.hits.len();
            ids.extend(page.hits.hits.into_iter().map(|hit| hit.id));

            let Some(scroll_id) = page.scroll_id else {
                break;
            };
            if fetched < SCROLL_PAGE_SIZE {
                self.clear_scroll(&scroll_id).await;
                break;
            }

            let next = self
                .scroll_page(self.request(Method::POST, "_search/scroll").json(&json!({
                    "scroll": SCROLL_KEEP_ALIVE,
                    "scroll_id": scroll_id,
                })))
                .await;
            page = match next {
                Ok(page) => page,
                Err(e) => {
                    self.clear_scroll(&scroll_id).await;
                    return Err(e);
                }
            };
        }

        Ok(ids)
    }

    async fn delete_documents(&self, index: &str, ids: &[String]) -> SearchResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let body = json!({
            "query": { "ids": { "values": ids } }
        });

        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_delete_by_query", index))
                    .query(&[("refresh", "true"), ("conflicts", "proceed")])
                    .json(&body),
            )
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::DeletionFailed(
                Self::describe_failure(response).await,
            ));
        }

        let parsed: DeleteByQueryResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;
        Ok(parsed.deleted)
    }

    async fn search(&self, index: &str, body: &Value) -> SearchResult<RawSearchResponse> {
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_search", index))
                    .json(body),
            )
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::SearchFailed(
                Self::describe_failure(response).await,
            ));
        }

        response
            .json::<RawSearchResponse>()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
