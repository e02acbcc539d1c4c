//! Product search: index synchronization and query gateway
//!
//! Product rows live in the relational store; this module mirrors them into
//! an external full-text engine (Elasticsearch) and answers storefront
//! searches from it.
//!
//! # Architecture
//!
//! ```text
//! product mutation ──► SyncWriter ──► DocumentProjector ──┐
//!                                                         ▼
//! POST /search/sync ─► BulkResynchronizer ──────────► SearchEngine ──► index
//!                         │                               ▲
//!                         └─► IndexSchemaManager ─────────┤
//!                                                         │
//! GET /search ──► SearchGateway ──► QueryTranslator ──────┘
//! ```
//!
//! Consistency between the two stores is advisory: index writes happen after
//! the relational commit, their failures are logged and swallowed, and the
//! bulk resync heals whatever drift accumulates.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storefront_search::search::{
//!     ElasticsearchClient, SearchConfig, SearchEngine, SearchGateway, SearchRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::default();
//!     let engine: Arc<dyn SearchEngine> = Arc::new(ElasticsearchClient::new(&config)?);
//!     let gateway = SearchGateway::new(engine, &config);
//!
//!     let request = SearchRequest::new("air max")
//!         .with_price_range(Some(100.0), None)
//!         .with_page_size(20);
//!
//!     let results = gateway.search(&request).await?;
//!     println!("Found {} products", results.total);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod document;
mod error;
mod query;
mod resync;
mod schema;
mod service;
mod sync;

pub use client::{
    DeleteOutcome, ElasticsearchClient, RawHit, RawHits, RawSearchResponse, RawSuggestEntry,
    RawSuggestOption, SearchEngine, TotalHits,
};
pub use config::{AnalyzerConfig, SearchConfig, SearchConfigBuilder};
pub use document::{coerce_price, DocumentProjector, ProductDocument};
pub use error::{SearchError, SearchResult};
pub use query::{QueryTranslator, SearchRequest, SUGGESTION_NAME};
pub use resync::{BulkResynchronizer, ResyncReport};
pub use schema::{index_definition, IndexSchemaManager, NAME_KEYWORD_FIELD, NAME_LOCALIZED_FIELD};
pub use service::{total_pages, ProductHit, SearchGateway, SearchParams, SearchResultSet, Suggestion};
pub use sync::{SyncOutcome, SyncWriter};
