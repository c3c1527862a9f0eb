//! Event logging and per-session aggregation
use crate::config::AnalyticsConfig;
use crate::storage::{self, KeyValueStore};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const ANALYTICS_NAMESPACE: &str = "search_analytics";
const MAX_TRAILING_SESSIONS: usize = 20;

/// One logged analytics event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub session_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

/// Aggregates for one page-lifetime session, continuously mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub search_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub total_time_ms: u64,
}

impl Session {
    fn new() -> Self {
        let start = Utc::now();
        Self {
            id: format!("session-{}", start.timestamp_millis()),
            start_time: start,
            search_count: 0,
            success_count: 0,
            failure_count: 0,
            total_time_ms: 0,
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.search_count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.search_count as f64
        }
    }
}

/// Derived session view plus a recent-event slice.
#[derive(Debug, Clone)]
pub struct AnalyticsSummary {
    pub session: Session,
    pub recent_events: Vec<AnalyticsEvent>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedAnalytics {
    sessions: Vec<Session>,
    events: Vec<AnalyticsEvent>,
}

/// Appends events to a bounded log, keeps the current session's aggregates
/// up to date and raises secondary "issue" events from real-time rules.
pub struct SearchAnalyticsCollector {
    store: Arc<dyn KeyValueStore>,
    config: AnalyticsConfig,
    session: Mutex<Session>,
    trailing_sessions: Mutex<Vec<Session>>,
    events: Mutex<Vec<AnalyticsEvent>>,
    seq: AtomicU64,
}

impl SearchAnalyticsCollector {
    pub fn new(store: Arc<dyn KeyValueStore>, config: AnalyticsConfig) -> Self {
        let persisted: PersistedAnalytics = storage::load_or_default(store.as_ref(), ANALYTICS_NAMESPACE);
        let mut trailing = persisted.sessions;
        trailing.truncate(MAX_TRAILING_SESSIONS);

        Self {
            store,
            config,
            session: Mutex::new(Session::new()),
            trailing_sessions: Mutex::new(trailing),
            events: Mutex::new(persisted.events),
            seq: AtomicU64::new(0),
        }
    }

    /// Log an event, update the session aggregates it implies and run the
    /// real-time issue rules against it.
    pub fn track_event(&self, event_type: &str, data: Value) {
        let event = self.append_event(event_type, data.clone());
        self.update_session(&event);
        self.run_issue_rules(event_type, &data);
        self.persist();
    }

    /// Current session view plus the most recent `n` events, newest last.
    pub fn analytics_summary(&self, n: usize) -> AnalyticsSummary {
        let events = self.events.lock();
        let start = events.len().saturating_sub(n);
        AnalyticsSummary {
            session: self.session.lock().clone(),
            recent_events: events[start..].to_vec(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    fn append_event(&self, event_type: &str, data: Value) -> AnalyticsEvent {
        let session_id = self.session.lock().id.clone();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = AnalyticsEvent {
            id: format!("evt-{}-{seq}", Utc::now().timestamp_millis()),
            session_id,
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
            data,
        };

        let mut events = self.events.lock();
        events.push(event.clone());
        if events.len() > self.config.max_events {
            let excess = events.len() - self.config.max_events;
            events.drain(0..excess);
        }

        event
    }

    fn update_session(&self, event: &AnalyticsEvent) {
        let mut session = self.session.lock();
        match event.event_type.as_str() {
            "search_success" => {
                session.search_count += 1;
                session.success_count += 1;
                if let Some(ms) = event.data.get("duration_ms").and_then(Value::as_u64) {
                    session.total_time_ms += ms;
                }
            }
            "search_failure" => {
                session.search_count += 1;
                session.failure_count += 1;
                if let Some(ms) = event.data.get("duration_ms").and_then(Value::as_u64) {
                    session.total_time_ms += ms;
                }
            }
            _ => {}
        }
    }

    // Secondary issue events go through append_event directly so a rule can
    // never re-trigger itself.
    fn run_issue_rules(&self, event_type: &str, data: &Value) {
        if let Some(ms) = data.get("duration_ms").and_then(Value::as_u64) {
            if ms >= self.config.issue_duration_ms {
                self.append_event("issue_slow_search", json!({ "duration_ms": ms }));
            }
        }

        if event_type == "search_success"
            && data.get("result_count").and_then(Value::as_u64) == Some(0)
        {
            self.append_event(
                "issue_zero_results",
                json!({ "query": data.get("query").cloned().unwrap_or(Value::Null) }),
            );
        }

        if event_type == "search_failure" {
            self.append_event(
                "issue_search_failure",
                json!({ "error": data.get("error").cloned().unwrap_or(Value::Null) }),
            );
        }
    }

    fn persist(&self) {
        let mut sessions = self.trailing_sessions.lock().clone();
        sessions.insert(0, self.session.lock().clone());
        sessions.truncate(MAX_TRAILING_SESSIONS);

        let snapshot = PersistedAnalytics {
            sessions,
            events: self.events.lock().clone(),
        };
        storage::save_best_effort(self.store.as_ref(), ANALYTICS_NAMESPACE, &snapshot);
    }
}
