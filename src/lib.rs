//! inksearch: client-side search orchestration for a tattoo-artist directory.
//!
//! The crate coordinates a single shared search state around a query model,
//! a TTL/LRU result cache, in-flight request deduplication, debounced
//! execution, persisted search history and analytics/performance/A-B
//! instrumentation. UI code talks only to [`EnhancedSearchController`];
//! the remote search API and the accessibility announcer are injected
//! collaborators.
pub mod abtest;
pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod dedup;
pub mod error;
pub mod history;
pub mod model;
pub mod perf;
pub mod query;
pub mod state;
pub mod storage;
pub mod styles;

pub use abtest::{ABTestFramework, AbTestDefinition, TestResults, Variant, VariantStats};
pub use analytics::{AnalyticsSummary, SearchAnalyticsCollector, SearchErrorTracker};
pub use api::{Announcer, LogAnnouncer, SearchApi, SearchRequest, SearchResponse};
pub use cache::{CacheStats, SearchCache};
pub use config::Config;
pub use controller::{EnhancedSearchController, FilterUpdate, Subscription};
pub use debounce::{DebouncePhase, DebouncedSearchExecutor};
pub use dedup::RequestDeduplicator;
pub use error::{Result, SearchError};
pub use history::{HistoryRecord, SearchHistoryManager};
pub use model::{Artist, FacetCount, Facets, SearchResults, Suggestion};
pub use perf::{PerformanceMonitor, SearchMetrics, SearchPerformanceMonitor};
pub use query::{Availability, LocationFilter, PriceRange, SearchQuery, SortBy};
pub use state::SearchState;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use styles::Difficulty;
