//! Product index definition and the schema manager that installs it

use crate::search::client::SearchEngine;
use crate::search::config::AnalyzerConfig;
use crate::search::error::{SearchError, SearchResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

/// Exact-match sub-field of `name`, used for sorting
pub const NAME_KEYWORD_FIELD: &str = "name.keyword";

/// Language-analyzed sub-field of `name`, used for matching and suggestions
pub const NAME_LOCALIZED_FIELD: &str = "name.localized";

/// Build settings and mappings for the product index
pub fn index_definition(analyzer: &AnalyzerConfig) -> Value {
    let analyzer_name = analyzer.analyzer_name();
    let stop_filter = format!("{}_stop", analyzer.language);
    let stemmer_filter = format!("{}_stemmer", analyzer.language);

    json!({
        "settings": {
            "analysis": {
                "filter": {
                    stop_filter.as_str(): {
                        "type": "stop",
                        "stopwords": analyzer.stopwords
                    },
                    stemmer_filter.as_str(): {
                        "type": "stemmer",
                        "language": analyzer.stemmer
                    }
                },
                "analyzer": {
                    analyzer_name.as_str(): {
                        "type": "custom",
                        "tokenizer": "standard",
                        "filter": ["lowercase", stop_filter.as_str(), stemmer_filter.as_str()]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "name": {
                    "type": "text",
                    "fields": {
                        "keyword": { "type": "keyword" },
                        "localized": { "type": "text", "analyzer": analyzer_name.as_str() }
                    }
                },
                "description": { "type": "text", "analyzer": analyzer_name.as_str() },
                "price": { "type": "float" },
                "category": { "type": "keyword" },
                "image": { "type": "keyword", "index": false }
            }
        }
    })
}

/// Makes sure the product index exists before any sync or query traffic
pub struct IndexSchemaManager {
    engine: Arc<dyn SearchEngine>,
    index_name: String,
    analyzer: AnalyzerConfig,
}

impl IndexSchemaManager {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        index_name: impl Into<String>,
        analyzer: AnalyzerConfig,
    ) -> Self {
        Self {
            engine,
            index_name: index_name.into(),
            analyzer,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Create the index if it is missing; a no-op when it already exists.
    ///
    /// Returns `true` when the index was created by this call. Any failure is
    /// a setup failure and must stop dependent traffic.
    pub async fn ensure_index(&self) -> SearchResult<bool> {
        let exists = self.engine.index_exists(&self.index_name).await.map_err(|e| {
            error!(index = %self.index_name, error = %e, "Failed to check search index");
            setup_failure(e)
        })?;

        if exists {
            return Ok(false);
        }

        self.engine
            .create_index(&self.index_name, &index_definition(&self.analyzer))
            .await
            .map_err(|e| {
                error!(index = %self.index_name, error = %e, "Failed to create search index");
                setup_failure(e)
            })?;

        info!(
            index = %self.index_name,
            analyzer = %self.analyzer.analyzer_name(),
            "Search index created"
        );
        Ok(true)
    }
}

fn setup_failure(err: SearchError) -> SearchError {
    match err {
        SearchError::IndexInitFailed(_) | SearchError::InvalidConfiguration(_) => err,
        other => SearchError::IndexInitFailed(other.to_string()),
    }
}
