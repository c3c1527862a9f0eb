//! Search analytics and error tracking
pub mod collector;
pub mod errors;

pub use collector::{AnalyticsEvent, AnalyticsSummary, SearchAnalyticsCollector, Session};
pub use errors::{ErrorTrends, SearchErrorTracker, TrackedError};
