//! Fine-grained timing capture with marks, classification and hints
use crate::config::PerformanceConfig;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Classification of a finished measurement against the configured
/// thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerfCategory {
    Fast,
    Acceptable,
    Slow,
}

impl PerfCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerfCategory::Fast => "fast",
            PerfCategory::Acceptable => "acceptable",
            PerfCategory::Slow => "slow",
        }
    }
}

/// An intermediate checkpoint inside a measurement.
#[derive(Debug, Clone)]
pub struct Mark {
    pub name: String,
    pub elapsed: Duration,
    pub data: Option<Value>,
}

struct ActiveMeasurement {
    started_at: Instant,
    marks: Vec<Mark>,
    metadata: Value,
}

/// A finalized measurement.
#[derive(Debug, Clone)]
pub struct CompletedMeasurement {
    pub id: String,
    pub duration: Duration,
    pub marks: Vec<Mark>,
    pub category: PerfCategory,
    pub hints: Vec<String>,
    pub metadata: Value,
    completed_at: Instant,
}

/// Timing capture for individual search executions.
///
/// Finished measurements are retained in a bounded table; `cleanup` drops
/// records older than the configured max age.
pub struct PerformanceMonitor {
    config: PerformanceConfig,
    active: Mutex<HashMap<String, ActiveMeasurement>>,
    completed: Mutex<Vec<CompletedMeasurement>>,
}

impl PerformanceMonitor {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            active: Mutex::new(HashMap::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    /// Begin timing. Restarting an id discards the earlier measurement.
    pub fn start_measurement(&self, id: impl Into<String>, metadata: Value) {
        self.active.lock().insert(
            id.into(),
            ActiveMeasurement {
                started_at: Instant::now(),
                marks: Vec::new(),
                metadata,
            },
        );
    }

    /// Record a checkpoint with elapsed time since the start. Unknown ids
    /// are ignored.
    pub fn add_mark(&self, id: &str, name: impl Into<String>, data: Option<Value>) {
        let mut active = self.active.lock();
        if let Some(measurement) = active.get_mut(id) {
            measurement.marks.push(Mark {
                name: name.into(),
                elapsed: measurement.started_at.elapsed(),
                data,
            });
        }
    }

    /// Finalize a measurement: compute duration, classify it and derive
    /// optimization hints. Returns `None` for unknown ids.
    pub fn end_measurement(&self, id: &str, metadata: Value) -> Option<CompletedMeasurement> {
        let active = self.active.lock().remove(id)?;
        let duration = active.started_at.elapsed();
        let merged = merge_metadata(active.metadata, metadata);
        let category = self.classify(duration);
        let hints = self.derive_hints(duration, &active.marks, &merged);

        let completed = CompletedMeasurement {
            id: id.to_string(),
            duration,
            marks: active.marks,
            category,
            hints,
            metadata: merged,
            completed_at: Instant::now(),
        };

        let mut table = self.completed.lock();
        table.push(completed.clone());
        let max = self.config.max_measurements;
        if table.len() > max {
            let excess = table.len() - max;
            table.drain(0..excess);
        }

        Some(completed)
    }

    /// Drop completed measurements older than the configured max age.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup(Duration::from_secs(self.config.measurement_max_age_secs))
    }

    /// Drop completed measurements older than `max_age`.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let mut table = self.completed.lock();
        let before = table.len();
        table.retain(|m| m.completed_at.elapsed() <= max_age);
        before - table.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.lock().len()
    }

    pub fn completed_measurements(&self) -> Vec<CompletedMeasurement> {
        self.completed.lock().clone()
    }

    fn classify(&self, duration: Duration) -> PerfCategory {
        let ms = duration.as_millis() as u64;
        if ms < self.config.fast_threshold_ms {
            PerfCategory::Fast
        } else if ms < self.config.slow_threshold_ms {
            PerfCategory::Acceptable
        } else {
            PerfCategory::Slow
        }
    }

    fn derive_hints(&self, duration: Duration, marks: &[Mark], metadata: &Value) -> Vec<String> {
        let mut hints = Vec::new();
        let total_ms = duration.as_millis() as u64;

        if total_ms >= self.config.slow_threshold_ms {
            hints.push(format!(
                "search took {total_ms}ms, above the {}ms slow threshold",
                self.config.slow_threshold_ms
            ));
        }

        // A phase eating more than half the total dominates the search.
        if total_ms > 0 {
            let mut previous = Duration::ZERO;
            for mark in marks {
                let phase = mark.elapsed.saturating_sub(previous);
                if phase.as_millis() * 2 > duration.as_millis() {
                    hints.push(format!(
                        "phase '{}' accounts for over half the total time",
                        mark.name
                    ));
                }
                previous = mark.elapsed;
            }
        }

        if metadata.get("complexity").and_then(Value::as_str) == Some("high") {
            hints.push("query declared high complexity; consider narrowing filters".to_string());
        }

        if metadata.get("result_count").and_then(Value::as_u64) == Some(0) {
            hints.push("search returned zero results; broaden the query".to_string());
        }

        hints
    }
}

fn merge_metadata(base: Value, extra: Value) -> Value {
    match (base, extra) {
        (Value::Object(mut base), Value::Object(extra)) => {
            for (k, v) in extra {
                base.insert(k, v);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, extra) => extra,
    }
}
