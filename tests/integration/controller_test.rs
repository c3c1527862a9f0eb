use async_trait::async_trait;
use inksearch::api::{SearchApi, SearchRequest, SearchResponse};
use inksearch::controller::{EnhancedSearchController, FilterUpdate};
use inksearch::error::{Result, SearchError};
use inksearch::model::{Artist, Suggestion};
use inksearch::query::SearchQuery;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Scripted API double: pops pre-programmed outcomes and counts calls.
struct StubApi {
    calls: AtomicUsize,
    script: Mutex<VecDeque<Result<SearchResponse>>>,
}

impl StubApi {
    fn scripted(outcomes: Vec<Result<SearchResponse>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Mutex::new(outcomes.into()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchApi for StubApi {
    async fn search(&self, _request: &SearchRequest) -> Result<SearchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(empty_response()))
    }
}

fn empty_response() -> SearchResponse {
    SearchResponse {
        items: Vec::new(),
        total_count: 0,
        facets: None,
    }
}

fn artist(id: &str, city: &str, styles: &[&str]) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("Artist {id}"),
        studio: None,
        city: Some(city.to_string()),
        postcode: None,
        styles: styles.iter().map(|s| s.to_string()).collect(),
        rating: Some(4.6),
        hourly_rate: Some(120),
    }
}

fn response(items: Vec<Artist>) -> SearchResponse {
    let total_count = items.len();
    SearchResponse {
        items,
        total_count,
        facets: None,
    }
}

fn controller(api: Arc<StubApi>) -> EnhancedSearchController {
    EnhancedSearchController::with_defaults(api)
}

#[tokio::test(start_paused = true)]
async fn repeat_query_within_ttl_is_served_from_cache() {
    let api = StubApi::scripted(vec![Ok(response(vec![artist(
        "a1",
        "Leeds",
        &["japanese"],
    )]))]);
    let controller = controller(Arc::clone(&api));
    let query = SearchQuery::new("dragon").with_styles(["japanese"]);

    let first = controller.execute_search(query.clone()).await.unwrap().unwrap();
    let second = controller.execute_search(query).await.unwrap().unwrap();

    assert_eq!(api.call_count(), 1);
    assert_eq!(first.items, second.items);
    assert_eq!(controller.cache().stats().hits, 1);
}

#[tokio::test(start_paused = true)]
async fn failure_reaches_state_and_retry_hits_the_api_again() {
    let api = StubApi::scripted(vec![
        Err(SearchError::Network("connection reset".to_string())),
        Ok(response(vec![artist("a1", "Leeds", &["realism"])])),
    ]);
    let controller = controller(Arc::clone(&api));
    let query = SearchQuery::new("portrait");

    let err = controller.execute_search(query.clone()).await.unwrap_err();
    assert!(matches!(err, SearchError::Network(_)));
    assert!(controller.state().error.is_some());
    assert!(!controller.state().loading);

    // No residual pending marker: the retry goes straight back to the API.
    let retried = controller.execute_search(query).await.unwrap().unwrap();
    assert_eq!(api.call_count(), 2);
    assert_eq!(retried.items.len(), 1);
    assert_eq!(controller.state().error, None);
}

#[tokio::test(start_paused = true)]
async fn zero_results_generate_alias_and_fewer_filter_suggestions() {
    let api = StubApi::scripted(vec![Ok(empty_response())]);
    let controller = controller(api);
    let query = SearchQuery::new("dragon").with_styles(["traditional"]);

    let results = controller.execute_search(query).await.unwrap().unwrap();

    assert!(results
        .suggestions
        .iter()
        .any(|s| matches!(s, Suggestion::Style { style } if style == "japanese")));
    assert!(results
        .suggestions
        .iter()
        .any(|s| matches!(s, Suggestion::FewerFilters)));
    assert_eq!(controller.state().suggestions, results.suggestions);
    assert_eq!(controller.state().total_count, 0);
}

#[tokio::test(start_paused = true)]
async fn results_populate_state_facets_and_history() {
    let api = StubApi::scripted(vec![Ok(response(vec![
        artist("a1", "Leeds", &["realism", "fineline"]),
        artist("a2", "Leeds", &["realism"]),
        artist("a3", "Manchester", &["blackwork"]),
    ]))]);
    let controller = controller(api);
    let query = SearchQuery::new("portrait").with_styles(["realism"]);

    controller.execute_search(query.clone()).await.unwrap();

    let state = controller.state();
    assert_eq!(state.total_count, 3);
    assert_eq!(state.facets.styles[0].value, "realism");
    assert_eq!(state.facets.styles[0].count, 2);
    assert_eq!(state.facets.cities[0].value, "Leeds");

    let recent = controller.history().recent_searches(5);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].query.cache_key(), query.cache_key());

    let summary = controller.analytics().analytics_summary(10);
    assert_eq!(summary.session.search_count, 1);
    assert_eq!(summary.session.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn apply_filters_merges_and_resets_the_page() {
    let api = StubApi::scripted(vec![
        Ok(response(vec![artist("a1", "Leeds", &["realism"])])),
        Ok(response(vec![artist("a1", "Leeds", &["realism"])])),
    ]);
    let controller = controller(api);

    controller
        .execute_search(SearchQuery::new("portrait").with_page(3))
        .await
        .unwrap();
    assert_eq!(controller.state().query.page, 3);

    controller
        .apply_filters(FilterUpdate {
            styles: Some(vec!["realism".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();

    let state = controller.state();
    assert_eq!(state.query.page, 1);
    assert_eq!(state.query.styles, vec!["realism".to_string()]);
    assert_eq!(state.query.text, "portrait");
}

#[tokio::test(start_paused = true)]
async fn clear_filters_keeps_only_free_text() {
    let api = StubApi::scripted(vec![
        Ok(response(vec![artist("a1", "Leeds", &["realism"])])),
        Ok(response(vec![artist("a1", "Leeds", &["realism"])])),
    ]);
    let controller = controller(api);

    controller
        .execute_search(
            SearchQuery::new("portrait")
                .with_styles(["realism"])
                .with_min_rating(4.0),
        )
        .await
        .unwrap();

    controller.clear_filters().await.unwrap();

    let state = controller.state();
    assert_eq!(state.query.text, "portrait");
    assert!(state.query.styles.is_empty());
    assert_eq!(state.query.min_rating, None);
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_loading_then_settled_snapshots_until_disposed() {
    let api = StubApi::scripted(vec![Ok(response(vec![artist("a1", "Leeds", &["realism"])]))]);
    let controller = controller(api);

    let snapshots: Arc<Mutex<Vec<bool>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let subscription = controller.subscribe(move |state| sink.lock().push(state.loading));

    controller
        .execute_search(SearchQuery::new("portrait"))
        .await
        .unwrap();

    let seen = snapshots.lock().clone();
    assert_eq!(seen.first(), Some(&true));
    assert_eq!(seen.last(), Some(&false));

    let count_before = snapshots.lock().len();
    subscription.dispose();
    controller.reset();
    assert_eq!(snapshots.lock().len(), count_before);
}

#[tokio::test(start_paused = true)]
async fn reset_restores_the_initial_state() {
    let api = StubApi::scripted(vec![Ok(response(vec![artist("a1", "Leeds", &["realism"])]))]);
    let controller = controller(api);

    controller
        .execute_search(SearchQuery::new("portrait"))
        .await
        .unwrap();
    assert!(controller.state().has_results());

    controller.reset();

    let state = controller.state();
    assert!(!state.has_results());
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.total_count, 0);
}

#[tokio::test(start_paused = true)]
async fn error_tracking_records_failures() {
    let api = StubApi::scripted(vec![Err(SearchError::Network("timeout".to_string()))]);
    let controller = controller(api);

    let _ = controller.execute_search(SearchQuery::new("portrait")).await;

    let trends = controller.error_tracker().error_trends();
    assert_eq!(trends.last_hour, 1);

    let summary = controller.analytics().analytics_summary(10);
    assert_eq!(summary.session.failure_count, 1);
    assert!(summary
        .recent_events
        .iter()
        .any(|e| e.event_type == "issue_search_failure"));
}
