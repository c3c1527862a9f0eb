//! Search orchestration: the single public entry point consumed by UI code
//!
//! Owns the shared `SearchState` and coordinates the cache, deduplicator,
//! debounced executor, history, analytics and performance monitors around it.
use crate::abtest::ABTestFramework;
use crate::analytics::{SearchAnalyticsCollector, SearchErrorTracker};
use crate::api::{Announcer, LogAnnouncer, SearchApi, SearchRequest};
use crate::cache::SearchCache;
use crate::config::Config;
use crate::debounce::DebouncedSearchExecutor;
use crate::dedup::RequestDeduplicator;
use crate::error::Result;
use crate::history::SearchHistoryManager;
use crate::model::{Artist, FacetCount, Facets, SearchResults, Suggestion};
use crate::perf::{PerformanceMonitor, SearchMetrics, SearchPerformanceMonitor};
use crate::query::{Availability, LocationFilter, PriceRange, SearchQuery, SortBy};
use crate::state::SearchState;
use crate::storage::{KeyValueStore, MemoryStore};
use crate::styles;
use log::debug;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

const MAX_SUGGESTIONS: usize = 5;
const MAX_STYLE_SUGGESTIONS: usize = 3;
const DEFAULT_RADIUS_KM: f64 = 20.0;

/// Partial update merged onto the current query by `apply_filters`. `None`
/// fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct FilterUpdate {
    pub text: Option<String>,
    pub styles: Option<Vec<String>>,
    pub location: Option<Option<LocationFilter>>,
    pub difficulty: Option<Vec<crate::styles::Difficulty>>,
    pub sort_by: Option<SortBy>,
    pub radius_km: Option<Option<f64>>,
    pub price_range: Option<Option<PriceRange>>,
    pub availability: Option<Option<Availability>>,
    pub min_rating: Option<Option<f32>>,
}

type SubscriberFn = Box<dyn Fn(&SearchState) + Send + Sync>;

struct ControllerInner {
    api: Arc<dyn SearchApi>,
    announcer: Arc<dyn Announcer>,
    cache: Arc<SearchCache<SearchResults>>,
    dedup: RequestDeduplicator<crate::api::SearchResponse>,
    history: SearchHistoryManager,
    analytics: SearchAnalyticsCollector,
    error_tracker: SearchErrorTracker,
    perf: PerformanceMonitor,
    search_perf: SearchPerformanceMonitor,
    abtests: ABTestFramework,
    state: Mutex<SearchState>,
    subscribers: Mutex<HashMap<u64, SubscriberFn>>,
    subscriber_seq: AtomicU64,
    search_seq: AtomicU64,
    complex_query_score: f64,
    sweep_interval: Duration,
}

/// Disposer returned by `subscribe`; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    inner: Weak<ControllerInner>,
}

impl Subscription {
    pub fn dispose(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.subscribers.lock().remove(&self.id);
        }
    }
}

/// The search orchestrator. Construct one per application context and share
/// it; there is no hidden global instance.
pub struct EnhancedSearchController {
    inner: Arc<ControllerInner>,
    debounce: DebouncedSearchExecutor<SearchQuery, SearchResults>,
}

impl EnhancedSearchController {
    pub fn new(
        api: Arc<dyn SearchApi>,
        store: Arc<dyn KeyValueStore>,
        announcer: Arc<dyn Announcer>,
        config: &Config,
    ) -> Self {
        let inner = Arc::new(ControllerInner {
            api,
            announcer,
            cache: Arc::new(SearchCache::from_config(&config.cache)),
            dedup: RequestDeduplicator::new(),
            history: SearchHistoryManager::new(Arc::clone(&store), &config.history),
            analytics: SearchAnalyticsCollector::new(Arc::clone(&store), config.analytics.clone()),
            error_tracker: SearchErrorTracker::new(),
            perf: PerformanceMonitor::new(config.performance.clone()),
            search_perf: SearchPerformanceMonitor::new(config.performance.clone()),
            abtests: ABTestFramework::new(store, config.abtest.clone()),
            state: Mutex::new(SearchState::new()),
            subscribers: Mutex::new(HashMap::new()),
            subscriber_seq: AtomicU64::new(0),
            search_seq: AtomicU64::new(0),
            complex_query_score: config.performance.complex_query_score,
            sweep_interval: Duration::from_secs(config.cache.sweep_interval_secs),
        });

        let exec_inner = Arc::clone(&inner);
        let debounce = DebouncedSearchExecutor::new(
            &config.debounce,
            Arc::new(move |query: SearchQuery| {
                let inner = Arc::clone(&exec_inner);
                Box::pin(async move { inner.execute_internal(query).await })
            }),
        );

        Self { inner, debounce }
    }

    /// Convenience constructor with in-memory persistence and log-backed
    /// announcements.
    pub fn with_defaults(api: Arc<dyn SearchApi>) -> Self {
        Self::new(
            api,
            Arc::new(MemoryStore::new()),
            Arc::new(LogAnnouncer),
            &Config::default(),
        )
    }

    /// Run a search. Resolves `Ok(Some(results))` for the call that survives
    /// debouncing, `Ok(None)` for superseded or cancelled calls. Failures set
    /// `state.error` and are re-thrown for UI handling.
    pub async fn execute_search(&self, query: SearchQuery) -> Result<Option<SearchResults>> {
        self.inner.set_loading(query.clone());
        self.inner.announcer.announce("Searching for artists");

        match self.debounce.call(query.clone()).await {
            Ok(Some(results)) => {
                self.inner.history.save_search(&query);
                self.inner
                    .announcer
                    .announce(&format!("{} artists found", results.total_count));
                Ok(Some(results))
            }
            Ok(None) => {
                debug!("search discarded by debounce: {}", query.cache_key());
                Ok(None)
            }
            Err(e) => {
                self.inner.set_error(e.to_string());
                self.inner
                    .announcer
                    .announce(&format!("Search failed: {e}"));
                Err(e)
            }
        }
    }

    /// Merge a partial filter update onto the current query, reset to the
    /// first page and re-execute.
    pub async fn apply_filters(&self, update: FilterUpdate) -> Result<Option<SearchResults>> {
        let current = self.inner.state.lock().query.clone();
        let mut query = current;

        if let Some(text) = update.text {
            query = query.with_text(text);
        }
        if let Some(styles) = update.styles {
            query = query.with_styles(styles);
        }
        if let Some(location) = update.location {
            query = match location {
                Some(l) => query.with_location(l),
                None => query.without_location(),
            };
        }
        if let Some(difficulty) = update.difficulty {
            query = query.with_difficulty(difficulty);
        }
        if let Some(sort_by) = update.sort_by {
            query = query.with_sort(sort_by);
        }
        if let Some(radius) = update.radius_km {
            query.radius_km = radius;
        }
        if let Some(price_range) = update.price_range {
            query.price_range = price_range;
        }
        if let Some(availability) = update.availability {
            query.availability = availability;
        }
        if let Some(min_rating) = update.min_rating {
            query.min_rating = min_rating;
        }

        self.execute_search(query.with_page(1)).await
    }

    /// Keep free text only, drop all structured filters and re-execute.
    pub async fn clear_filters(&self) -> Result<Option<SearchResults>> {
        let query = self.inner.state.lock().query.cleared_filters();
        self.execute_search(query).await
    }

    /// Clear the pending debounce timer without executing it.
    pub fn cancel_pending_search(&self) {
        self.debounce.cancel();
        let mut state = self.inner.state.lock();
        if state.loading {
            state.loading = false;
            let snapshot = state.clone();
            drop(state);
            self.inner.notify_subscribers(&snapshot);
        }
    }

    /// Force the pending debounced call to run immediately.
    pub fn flush_pending_search(&self) {
        self.debounce.flush();
    }

    /// Cancel pending work and restore the initial state.
    pub fn reset(&self) {
        self.debounce.cancel();
        let snapshot = {
            let mut state = self.inner.state.lock();
            *state = SearchState::new();
            state.clone()
        };
        self.inner.notify_subscribers(&snapshot);
    }

    /// Register a subscriber. It receives a read-only snapshot on every state
    /// change until the returned `Subscription` is dropped.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn(&SearchState) + Send + Sync + 'static,
    {
        let id = self.inner.subscriber_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().insert(id, Box::new(f));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.inner.state.lock().clone()
    }

    pub fn history(&self) -> &SearchHistoryManager {
        &self.inner.history
    }

    pub fn analytics(&self) -> &SearchAnalyticsCollector {
        &self.inner.analytics
    }

    pub fn error_tracker(&self) -> &SearchErrorTracker {
        &self.inner.error_tracker
    }

    pub fn performance(&self) -> &PerformanceMonitor {
        &self.inner.perf
    }

    pub fn search_performance(&self) -> &SearchPerformanceMonitor {
        &self.inner.search_perf
    }

    pub fn abtests(&self) -> &ABTestFramework {
        &self.inner.abtests
    }

    pub fn cache(&self) -> &Arc<SearchCache<SearchResults>> {
        &self.inner.cache
    }

    /// Start the periodic cache expiry sweep on the current tokio runtime.
    /// Dropping the returned handle does not stop the task; abort it to stop.
    pub fn start_cache_sweeper(&self) -> tokio::task::JoinHandle<()> {
        self.inner.cache.spawn_sweeper(self.inner.sweep_interval)
    }
}

impl ControllerInner {
    /// The internal execution routine run by the debounced executor:
    /// cache lookup, deduplicated API call, post-processing, state update.
    async fn execute_internal(self: Arc<Self>, query: SearchQuery) -> Result<SearchResults> {
        let key = query.cache_key();
        let search_id = format!("search-{}", self.search_seq.fetch_add(1, Ordering::Relaxed));
        let complexity = self.search_perf.complexity_score(&query);
        let started = Instant::now();

        self.perf.start_measurement(
            &search_id,
            json!({
                "cache_key": key.as_str(),
                "complexity": if complexity >= self.complex_query_score { "high" } else { "normal" },
            }),
        );

        if let Some(results) = self.cache.get(&key) {
            debug!("cache hit for {key}");
            self.perf.add_mark(&search_id, "cache_hit", None);
            self.finish_search(&search_id, &query, &results, started, true);
            self.publish_success(query, &results, started);
            return Ok(results);
        }
        self.perf.add_mark(&search_id, "cache_miss", None);

        let request = SearchRequest::from_query(&query);
        let api = Arc::clone(&self.api);
        let outcome = self
            .dedup
            .execute(&key, || async move { api.search(&request).await })
            .await;
        self.perf.add_mark(&search_id, "api_settled", None);

        match outcome {
            Ok(response) => {
                let results = post_process(&response.items, response.total_count, &query);
                self.cache.put(key, results.clone());
                self.finish_search(&search_id, &query, &results, started, false);
                self.publish_success(query, &results, started);
                Ok(results)
            }
            Err(e) => {
                // Clear any stale entry so a retry goes back to the API.
                self.cache.remove(&key);
                self.error_tracker
                    .track_error(&e, json!({ "cache_key": key.as_str() }));
                self.analytics.track_event(
                    "search_failure",
                    json!({
                        "duration_ms": started.elapsed().as_millis() as u64,
                        "error": e.to_string(),
                    }),
                );
                self.perf.end_measurement(&search_id, json!({ "failed": true }));
                Err(e)
            }
        }
    }

    fn finish_search(
        &self,
        search_id: &str,
        query: &SearchQuery,
        results: &SearchResults,
        started: Instant,
        cache_hit: bool,
    ) {
        let duration = started.elapsed();

        self.analytics.track_event(
            "search_success",
            json!({
                "duration_ms": duration.as_millis() as u64,
                "result_count": results.items.len(),
                "cache_hit": cache_hit,
                "query": query.text.as_str(),
            }),
        );
        self.search_perf.record_search(
            search_id,
            query,
            SearchMetrics {
                duration,
                cache_hit,
                result_count: results.items.len(),
            },
        );
        self.perf.end_measurement(
            search_id,
            json!({ "result_count": results.items.len(), "cache_hit": cache_hit }),
        );
    }

    fn publish_success(&self, query: SearchQuery, results: &SearchResults, started: Instant) {
        let snapshot = {
            let mut state = self.state.lock();
            state.query = query;
            state.results = Some(results.items.clone());
            state.loading = false;
            state.error = None;
            state.total_count = results.total_count;
            state.facets = results.facets.clone();
            state.suggestions = results.suggestions.clone();
            state.execution_time = Some(started.elapsed());
            state.last_updated = chrono::Utc::now();
            state.clone()
        };
        self.notify_subscribers(&snapshot);
    }

    fn set_loading(&self, query: SearchQuery) {
        let snapshot = {
            let mut state = self.state.lock();
            state.query = query;
            state.loading = true;
            state.error = None;
            state.clone()
        };
        self.notify_subscribers(&snapshot);
    }

    fn set_error(&self, message: String) {
        let snapshot = {
            let mut state = self.state.lock();
            state.loading = false;
            state.error = Some(message);
            state.last_updated = chrono::Utc::now();
            state.clone()
        };
        self.notify_subscribers(&snapshot);
    }

    fn notify_subscribers(&self, snapshot: &SearchState) {
        for subscriber in self.subscribers.lock().values() {
            subscriber(snapshot);
        }
    }
}

/// Build the presented result set from validated API items.
fn post_process(items: &[Artist], total_count: usize, query: &SearchQuery) -> SearchResults {
    SearchResults {
        items: items.to_vec(),
        total_count,
        facets: generate_facets(items),
        suggestions: generate_suggestions(query, items),
    }
}

/// Suggestions for thin result sets, capped at `MAX_SUGGESTIONS`.
fn generate_suggestions(query: &SearchQuery, items: &[Artist]) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if items.is_empty() {
        // Style matches are capped below the overall limit so the structural
        // suggestions are never pushed out by a term that matches many styles.
        for style in styles::styles_matching_term(&query.text)
            .into_iter()
            .filter(|style| !query.styles.iter().any(|s| s == style))
            .take(MAX_STYLE_SUGGESTIONS)
        {
            suggestions.push(Suggestion::Style {
                style: style.to_string(),
            });
        }
        suggestions.push(Suggestion::FewerFilters);
        if query.location.is_some() {
            suggestions.push(Suggestion::WidenRadius {
                radius_km: query.radius_km.unwrap_or(DEFAULT_RADIUS_KM) * 2.0,
            });
        }
    } else if items.len() <= 4 {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in items {
            for style in &item.styles {
                if !query.styles.iter().any(|s| s == style) {
                    *counts.entry(style.as_str()).or_insert(0) += 1;
                }
            }
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        for (style, _) in ranked {
            suggestions.push(Suggestion::AlsoSearch {
                style: style.to_string(),
            });
        }
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

/// Tally style, city and difficulty occurrence across the result set.
fn generate_facets(items: &[Artist]) -> Facets {
    let mut style_counts: HashMap<String, usize> = HashMap::new();
    let mut city_counts: HashMap<String, usize> = HashMap::new();
    let mut difficulty_counts: HashMap<&'static str, usize> = HashMap::new();

    for item in items {
        for style in &item.styles {
            *style_counts.entry(style.clone()).or_insert(0) += 1;
        }
        if let Some(city) = &item.city {
            *city_counts.entry(city.clone()).or_insert(0) += 1;
        }
        for difficulty in item.difficulties() {
            *difficulty_counts.entry(difficulty.as_str()).or_insert(0) += 1;
        }
    }

    Facets {
        styles: into_facet_counts(style_counts),
        cities: into_facet_counts(city_counts),
        difficulty: into_facet_counts(
            difficulty_counts
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        ),
    }
}

fn into_facet_counts(counts: HashMap<String, usize>) -> Vec<FacetCount> {
    let mut out: Vec<FacetCount> = counts
        .into_iter()
        .map(|(value, count)| FacetCount { value, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}
