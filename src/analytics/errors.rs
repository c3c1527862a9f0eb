//! Normalized error records with frequency counting and trend windows
use crate::error::SearchError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const MAX_ERROR_RECORDS: usize = 500;

/// One normalized, logged error occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedError {
    pub error_type: String,
    pub message: String,
    pub context: Value,
    pub occurred_at: DateTime<Utc>,
}

/// Error counts over trailing windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTrends {
    pub last_hour: usize,
    pub last_day: usize,
}

/// Logs errors with a frequency counter keyed by (type, message).
pub struct SearchErrorTracker {
    records: Mutex<Vec<TrackedError>>,
    frequency: Mutex<HashMap<(String, String), u64>>,
}

impl SearchErrorTracker {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            frequency: Mutex::new(HashMap::new()),
        }
    }

    pub fn track_error(&self, error: &SearchError, context: Value) {
        let record = TrackedError {
            error_type: error.kind().to_string(),
            message: error.to_string(),
            context,
            occurred_at: Utc::now(),
        };

        *self
            .frequency
            .lock()
            .entry((record.error_type.clone(), record.message.clone()))
            .or_insert(0) += 1;

        let mut records = self.records.lock();
        records.push(record);
        if records.len() > MAX_ERROR_RECORDS {
            let excess = records.len() - MAX_ERROR_RECORDS;
            records.drain(0..excess);
        }
    }

    /// Occurrence count for a specific (type, message) pair.
    pub fn frequency(&self, error_type: &str, message: &str) -> u64 {
        self.frequency
            .lock()
            .get(&(error_type.to_string(), message.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Counts over the trailing 1-hour and 24-hour windows.
    pub fn error_trends(&self) -> ErrorTrends {
        let now = Utc::now();
        let hour_ago = now - ChronoDuration::hours(1);
        let day_ago = now - ChronoDuration::hours(24);

        let records = self.records.lock();
        ErrorTrends {
            last_hour: records.iter().filter(|r| r.occurred_at >= hour_ago).count(),
            last_day: records.iter().filter(|r| r.occurred_at >= day_ago).count(),
        }
    }

    pub fn recent_errors(&self, n: usize) -> Vec<TrackedError> {
        let records = self.records.lock();
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }
}

impl Default for SearchErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}
