use thiserror::Error;

/// Errors surfaced by the search orchestration layer.
///
/// Variants carry owned strings rather than wrapped sources so the enum stays
/// `Clone`: deduplicated callers for one cache key all observe the same
/// failure value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid query: {0}")]
    Validation(String),

    #[error("Search API error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl SearchError {
    /// Short machine-friendly tag used by analytics and error tracking.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Validation(_) => "validation",
            SearchError::Network(_) => "network",
            SearchError::Storage(_) => "storage",
            SearchError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        SearchError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for SearchError {
    fn from(e: std::io::Error) -> Self {
        SearchError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
