//! Search configuration

use serde::{Deserialize, Serialize};

/// Search subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the search engine node
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Name of the product index
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Per-request timeout against the engine, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Basic auth username (security disabled when absent)
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Language-aware analyzer settings
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Concurrent document writes during a bulk resync
    #[serde(default = "default_resync_concurrency")]
    pub resync_concurrency: usize,

    /// Page size used when the request carries none (or an invalid one)
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound for a requested page size
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Deepest hit (offset + page size) the engine will page to
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u64,

    /// Category label stored when a product has no resolvable category
    #[serde(default = "default_category_sentinel")]
    pub default_category: String,
}

/// Stop-word and stemming setup for the deployment's primary language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzerConfig {
    /// Language tag, used to name the analyzer and its filters
    pub language: String,

    /// Stop-word list reference understood by the engine (e.g. `_spanish_`)
    pub stopwords: String,

    /// Stemmer language understood by the engine (e.g. `light_spanish`)
    pub stemmer: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            language: "spanish".to_string(),
            stopwords: "_spanish_".to_string(),
            stemmer: "light_spanish".to_string(),
        }
    }
}

impl AnalyzerConfig {
    /// Name under which the analyzer is registered in the index settings
    pub fn analyzer_name(&self) -> String {
        format!("{}_products", self.language)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            index_name: default_index_name(),
            request_timeout_secs: default_request_timeout(),
            username: None,
            password: None,
            analyzer: AnalyzerConfig::default(),
            resync_concurrency: default_resync_concurrency(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            max_result_window: default_max_result_window(),
            default_category: default_category_sentinel(),
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn node_url(mut self, url: impl Into<String>) -> Self {
        self.config.node_url = url.into();
        self
    }

    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.config.index_name = name.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    pub fn analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.config.analyzer = analyzer;
        self
    }

    pub fn resync_concurrency(mut self, concurrency: usize) -> Self {
        self.config.resync_concurrency = concurrency;
        self
    }

    pub fn page_sizes(mut self, default_size: u32, max_size: u32) -> Self {
        self.config.default_page_size = default_size;
        self.config.max_page_size = max_size;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_node_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index_name() -> String {
    "products".to_string()
}

fn default_request_timeout() -> u64 {
    5
}

fn default_resync_concurrency() -> usize {
    4
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    100
}

fn default_max_result_window() -> u64 {
    10_000
}

fn default_category_sentinel() -> String {
    "uncategorized".to_string()
}
