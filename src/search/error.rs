//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Index could not be checked or created
    #[error("Index initialization failed: {0}")]
    IndexInitFailed(String),

    /// Search execution failed (engine rejected the query)
    #[error("Search execution failed: {0}")]
    SearchFailed(String),

    /// Document indexing failed
    #[error("Document indexing failed: {0}")]
    IndexingFailed(String),

    /// Document deletion failed
    #[error("Document deletion failed: {0}")]
    DeletionFailed(String),

    /// Engine unreachable or the connection dropped
    #[error("Search engine unreachable: {0}")]
    Transport(String),

    /// Engine did not answer within the configured timeout
    #[error("Search engine request timed out after {0}s")]
    Timeout(u64),

    /// Engine answered with a body we could not decode
    #[error("Unexpected search engine response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SearchError {
    /// Transport-level failures worth retrying later through a resync
    pub fn is_transient(&self) -> bool {
        matches!(self, SearchError::Transport(_) | SearchError::Timeout(_))
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            SearchError::Timeout(secs) => {
                AppError::Timeout(format!("search engine did not answer within {}s", secs))
            }
            _ => AppError::Search(err.to_string()),
        }
    }
}
