//! Sticky A/B test assignment and per-variant metric aggregation
use crate::config::AbTestConfig;
use crate::storage::{self, KeyValueStore};
use chrono::{DateTime, Utc};
use log::warn;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const ABTEST_NAMESPACE: &str = "ab_tests";

/// One arm of a test with its share of the traffic split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    /// Percentage of subjects assigned to this variant. Weights across a
    /// test's variants should sum to 100.
    pub weight: u8,
}

/// Definition of a test as registered by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestDefinition {
    pub id: String,
    pub variants: Vec<Variant>,
    pub active: bool,
    /// Metric names this test tracks, informational only.
    pub metrics: Vec<String>,
}

/// Running aggregates for one variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantStats {
    pub users: u64,
    pub events: u64,
    pub conversions: u64,
    pub search_successes: u64,
    pub search_failures: u64,
    pub conversion_rate: f64,
    pub search_success_rate: f64,
}

impl VariantStats {
    fn recompute(&mut self) {
        self.conversion_rate = if self.users == 0 {
            0.0
        } else {
            self.conversions as f64 / self.users as f64
        };
        let settled = self.search_successes + self.search_failures;
        self.search_success_rate = if settled == 0 {
            0.0
        } else {
            self.search_successes as f64 / settled as f64
        };
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTestEvent {
    pub variant: String,
    pub event_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Definition plus computed aggregates, as returned to callers.
#[derive(Debug, Clone)]
pub struct TestResults {
    pub definition: AbTestDefinition,
    pub variants: HashMap<String, VariantStats>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TestState {
    definition: AbTestDefinition,
    stats: HashMap<String, VariantStats>,
    events: Vec<AbTestEvent>,
}

impl Default for AbTestDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            variants: Vec::new(),
            active: false,
            metrics: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Registry {
    tests: HashMap<String, TestState>,
    /// Sticky assignments keyed by "test_id:subject_id".
    assignments: HashMap<String, String>,
}

/// Sticky variant assignment with per-variant metric aggregation, persisted
/// for durability across reloads.
pub struct ABTestFramework {
    store: Arc<dyn KeyValueStore>,
    config: AbTestConfig,
    registry: Mutex<Registry>,
}

impl ABTestFramework {
    pub fn new(store: Arc<dyn KeyValueStore>, config: AbTestConfig) -> Self {
        let registry: Registry = storage::load_or_default(store.as_ref(), ABTEST_NAMESPACE);
        Self {
            store,
            config,
            registry: Mutex::new(registry),
        }
    }

    /// Register (or replace) a test definition.
    pub fn create_test(&self, definition: AbTestDefinition) {
        if definition.variants.is_empty() {
            warn!("ignoring test '{}' with no variants", definition.id);
            return;
        }
        let total: u32 = definition.variants.iter().map(|v| v.weight as u32).sum();
        if total != 100 {
            warn!("test '{}' variant weights sum to {total}, not 100", definition.id);
        }

        {
            let mut registry = self.registry.lock();
            let id = definition.id.clone();
            registry.tests.insert(
                id,
                TestState {
                    definition,
                    stats: HashMap::new(),
                    events: Vec::new(),
                },
            );
        }
        self.persist();
    }

    /// Resolve the sticky variant for a subject, drawing and persisting an
    /// assignment on first contact. Returns `None` for unknown or inactive
    /// tests.
    pub fn user_variant(&self, test_id: &str, subject_id: &str) -> Option<String> {
        let assignment_key = format!("{test_id}:{subject_id}");

        let assigned = {
            let mut registry = self.registry.lock();

            if let Some(existing) = registry.assignments.get(&assignment_key) {
                return Some(existing.clone());
            }

            let variant = {
                let state = registry.tests.get(test_id)?;
                if !state.definition.active {
                    return None;
                }
                draw_variant(&state.definition.variants)?
            };

            registry
                .assignments
                .insert(assignment_key, variant.clone());

            if let Some(state) = registry.tests.get_mut(test_id) {
                let stats = state.stats.entry(variant.clone()).or_default();
                stats.users += 1;
                stats.recompute();
            }

            variant
        };

        self.persist();
        Some(assigned)
    }

    /// Log an event against the subject's variant and recompute derived
    /// metrics.
    pub fn track_event(&self, test_id: &str, event_type: &str, data: Value, subject_id: &str) {
        let Some(variant) = self.user_variant(test_id, subject_id) else {
            return;
        };

        {
            let mut registry = self.registry.lock();
            let Some(state) = registry.tests.get_mut(test_id) else {
                return;
            };

            state.events.push(AbTestEvent {
                variant: variant.clone(),
                event_type: event_type.to_string(),
                data,
                timestamp: Utc::now(),
            });
            if state.events.len() > self.config.max_events_per_test {
                let excess = state.events.len() - self.config.max_events_per_test;
                state.events.drain(0..excess);
            }

            let stats = state.stats.entry(variant).or_default();
            stats.events += 1;
            match event_type {
                "conversion" => stats.conversions += 1,
                "search_success" => stats.search_successes += 1,
                "search_failure" => stats.search_failures += 1,
                _ => {}
            }
            stats.recompute();
        }
        self.persist();
    }

    /// Definition plus computed aggregates for one test.
    pub fn test_results(&self, test_id: &str) -> Option<TestResults> {
        let registry = self.registry.lock();
        registry.tests.get(test_id).map(|state| TestResults {
            definition: state.definition.clone(),
            variants: state.stats.clone(),
        })
    }

    fn persist(&self) {
        let registry = self.registry.lock();
        storage::save_best_effort(self.store.as_ref(), ABTEST_NAMESPACE, &*registry);
    }
}

fn draw_variant(variants: &[Variant]) -> Option<String> {
    let total: u32 = variants.iter().map(|v| v.weight as u32).sum();
    if total == 0 {
        return variants.first().map(|v| v.name.clone());
    }

    let mut roll = rand::rng().random_range(0..total);
    for variant in variants {
        if roll < variant.weight as u32 {
            return Some(variant.name.clone());
        }
        roll -= variant.weight as u32;
    }
    variants.last().map(|v| v.name.clone())
}
