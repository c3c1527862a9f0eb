//! Persisted recent-search history
use crate::config::HistoryConfig;
use crate::query::SearchQuery;
use crate::storage::{self, KeyValueStore};
use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const HISTORY_NAMESPACE: &str = "search_history";

/// Persisted form of one history entry: raw query parameters plus metadata.
/// Queries are rebuilt from the parameters on load, so schema drift in
/// `SearchQuery` itself never corrupts the stored history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedRecord {
    id: String,
    params: Vec<(String, String)>,
    cache_key: String,
    recorded_at: DateTime<Utc>,
}

/// One reconstructed history entry.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub id: String,
    pub query: SearchQuery,
    pub recorded_at: DateTime<Utc>,
}

/// Bounded, de-duplicated, newest-first search history persisted through the
/// key-value store.
pub struct SearchHistoryManager {
    store: Arc<dyn KeyValueStore>,
    max_entries: usize,
    records: Mutex<Vec<PersistedRecord>>,
    seq: AtomicU64,
}

impl SearchHistoryManager {
    pub fn new(store: Arc<dyn KeyValueStore>, config: &HistoryConfig) -> Self {
        let records: Vec<PersistedRecord> = storage::load_or_default(store.as_ref(), HISTORY_NAMESPACE);
        Self {
            store,
            max_entries: config.max_entries,
            records: Mutex::new(records),
            seq: AtomicU64::new(0),
        }
    }

    /// Record a search. Filterless queries are not worth remembering; repeat
    /// queries move to the front rather than duplicate.
    pub fn save_search(&self, query: &SearchQuery) {
        if !query.has_filters() {
            return;
        }

        let cache_key = query.cache_key();
        let record = PersistedRecord {
            id: self.next_id(),
            params: query.to_query_params(),
            cache_key: cache_key.clone(),
            recorded_at: Utc::now(),
        };

        let snapshot = {
            let mut records = self.records.lock();
            records.retain(|r| r.cache_key != cache_key);
            records.insert(0, record);
            records.truncate(self.max_entries);
            records.clone()
        };

        storage::save_best_effort(self.store.as_ref(), HISTORY_NAMESPACE, &snapshot);
    }

    /// The most recent `n` searches, newest first. Records whose parameters
    /// no longer parse are skipped with a warning.
    pub fn recent_searches(&self, n: usize) -> Vec<HistoryRecord> {
        self.records
            .lock()
            .iter()
            .take(n)
            .filter_map(|r| match SearchQuery::from_query_params(&r.params) {
                Ok(query) => Some(HistoryRecord {
                    id: r.id.clone(),
                    query,
                    recorded_at: r.recorded_at,
                }),
                Err(e) => {
                    warn!("dropping unreadable history record {}: {e}", r.id);
                    None
                }
            })
            .collect()
    }

    pub fn remove_search(&self, id: &str) {
        let snapshot = {
            let mut records = self.records.lock();
            records.retain(|r| r.id != id);
            records.clone()
        };
        storage::save_best_effort(self.store.as_ref(), HISTORY_NAMESPACE, &snapshot);
    }

    pub fn clear_history(&self) {
        self.records.lock().clear();
        if let Err(e) = self.store.remove(HISTORY_NAMESPACE) {
            warn!("failed to clear persisted history: {e}");
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn next_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().timestamp_millis(), seq)
    }
}
