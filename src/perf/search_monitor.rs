//! Aggregate-level search performance tracking and recommendations
use crate::config::PerformanceConfig;
use crate::query::SearchQuery;
use parking_lot::Mutex;
use std::time::Duration;

/// Per-search metrics reported by the controller after a search settles.
#[derive(Debug, Clone)]
pub struct SearchMetrics {
    pub duration: Duration,
    pub cache_hit: bool,
    pub result_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
}

/// A human-readable, actionable recommendation.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub message: String,
}

#[derive(Debug, Clone)]
struct SearchRecord {
    #[allow(dead_code)]
    search_id: String,
    metrics: SearchMetrics,
    complexity: f64,
}

/// Stores per-search records, scores query complexity and derives both
/// per-record and aggregate recommendations.
pub struct SearchPerformanceMonitor {
    config: PerformanceConfig,
    records: Mutex<Vec<SearchRecord>>,
}

impl SearchPerformanceMonitor {
    pub fn new(config: PerformanceConfig) -> Self {
        Self {
            config,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Structural complexity of a query. Weights are tunable configuration,
    /// not a contract.
    pub fn complexity_score(&self, query: &SearchQuery) -> f64 {
        let c = &self.config;
        let mut score = 0.0;

        let words = query.text.split_whitespace().count();
        score += c.complexity_text_weight * (words as f64 + query.text.len() as f64 / 20.0);

        let filter_count = query.styles.len()
            + query.difficulty.len()
            + usize::from(query.price_range.is_some())
            + usize::from(query.availability.is_some())
            + usize::from(query.min_rating.is_some());
        score += c.complexity_filter_weight * filter_count as f64;

        if query.location.is_some() {
            score += c.complexity_location_weight;
            if query.radius_km.is_some() {
                score += c.complexity_location_weight / 2.0;
            }
        }

        score
    }

    /// Record one settled search and return any per-record recommendations.
    pub fn record_search(
        &self,
        search_id: impl Into<String>,
        query: &SearchQuery,
        metrics: SearchMetrics,
    ) -> Vec<Recommendation> {
        let complexity = self.complexity_score(query);
        let mut recommendations = Vec::new();
        let ms = metrics.duration.as_millis() as u64;

        if ms >= self.config.slow_threshold_ms {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::High,
                message: format!("search took {ms}ms; investigate the API response time"),
            });
        }
        if !metrics.cache_hit && complexity >= self.config.complex_query_score {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Medium,
                message: "complex query missed the cache; consider pre-warming popular filter combinations".to_string(),
            });
        }
        if metrics.result_count == 0 {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Low,
                message: "zero results; surface query suggestions to the user".to_string(),
            });
        }

        let mut records = self.records.lock();
        records.push(SearchRecord {
            search_id: search_id.into(),
            metrics,
            complexity,
        });
        let max = self.config.max_measurements;
        if records.len() > max {
            let excess = records.len() - max;
            records.drain(..excess);
        }

        recommendations
    }

    /// Aggregate stored records against the configured thresholds into
    /// prioritized recommendations, highest priority first.
    pub fn optimization_recommendations(&self) -> Vec<Recommendation> {
        let records = self.records.lock();
        if records.is_empty() {
            return Vec::new();
        }

        let total = records.len() as f64;
        let avg_ms = records
            .iter()
            .map(|r| r.metrics.duration.as_millis() as f64)
            .sum::<f64>()
            / total;
        let hit_rate = records.iter().filter(|r| r.metrics.cache_hit).count() as f64 / total;
        let slow_rate = records
            .iter()
            .filter(|r| r.metrics.duration.as_millis() as u64 >= self.config.slow_threshold_ms)
            .count() as f64
            / total;

        let mut recommendations = Vec::new();

        if avg_ms >= self.config.slow_threshold_ms as f64 {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::High,
                message: format!(
                    "average search duration is {avg_ms:.0}ms, above the {}ms threshold",
                    self.config.slow_threshold_ms
                ),
            });
        }
        if hit_rate < self.config.min_cache_hit_rate {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::Medium,
                message: format!(
                    "cache hit rate is {:.0}%, below the {:.0}% target; review TTL and capacity",
                    hit_rate * 100.0,
                    self.config.min_cache_hit_rate * 100.0
                ),
            });
        }
        if slow_rate > self.config.max_slow_rate {
            recommendations.push(Recommendation {
                priority: RecommendationPriority::High,
                message: format!(
                    "{:.0}% of searches are slow, above the {:.0}% budget",
                    slow_rate * 100.0,
                    self.config.max_slow_rate * 100.0
                ),
            });
        }

        let complex: Vec<&SearchRecord> = records
            .iter()
            .filter(|r| r.complexity >= self.config.complex_query_score)
            .collect();
        if !complex.is_empty() {
            let complex_hit_rate =
                complex.iter().filter(|r| r.metrics.cache_hit).count() as f64
                    / complex.len() as f64;
            if complex_hit_rate < self.config.min_cache_hit_rate {
                recommendations.push(Recommendation {
                    priority: RecommendationPriority::Medium,
                    message: format!(
                        "complex queries hit the cache only {:.0}% of the time; pre-warm popular filter combinations",
                        complex_hit_rate * 100.0
                    ),
                });
            }
        }

        recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));
        recommendations
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().len()
    }
}
