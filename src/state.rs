use crate::model::{Artist, Facets, Suggestion};
use crate::query::SearchQuery;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// The single shared search state.
///
/// The controller is the only writer; subscribers receive cloned snapshots,
/// never shared mutable references.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub query: SearchQuery,
    pub results: Option<Vec<Artist>>,
    pub loading: bool,
    pub error: Option<String>,
    pub total_count: usize,
    pub facets: Facets,
    pub suggestions: Vec<Suggestion>,
    pub execution_time: Option<Duration>,
    pub last_updated: DateTime<Utc>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            query: SearchQuery::new(""),
            results: None,
            loading: false,
            error: None,
            total_count: 0,
            facets: Facets::default(),
            suggestions: Vec::new(),
            execution_time: None,
            last_updated: Utc::now(),
        }
    }

    /// True once a search has produced a (possibly empty) result list.
    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}
