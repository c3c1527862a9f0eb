//! Performance instrumentation for the search pipeline
pub mod monitor;
pub mod search_monitor;

pub use monitor::{CompletedMeasurement, Mark, PerfCategory, PerformanceMonitor};
pub use search_monitor::{
    Recommendation, RecommendationPriority, SearchMetrics, SearchPerformanceMonitor,
};
