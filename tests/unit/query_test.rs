use inksearch::query::{Availability, LocationFilter, PriceRange, SearchQuery, SortBy};
use inksearch::styles::Difficulty;
use proptest::prelude::*;

#[test]
fn cache_key_is_order_independent_over_styles() {
    let a = SearchQuery::new("dragon").with_styles(["japanese", "traditional", "blackwork"]);
    let b = SearchQuery::new("dragon").with_styles(["blackwork", "japanese", "traditional"]);
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn cache_key_is_order_independent_over_difficulty() {
    let a = SearchQuery::new("").with_difficulty([Difficulty::Advanced, Difficulty::Beginner]);
    let b = SearchQuery::new("").with_difficulty([Difficulty::Beginner, Difficulty::Advanced]);
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn cache_key_ignores_creation_time() {
    let a = SearchQuery::new("rose");
    std::thread::sleep(std::time::Duration::from_millis(5));
    let b = SearchQuery::new("rose");
    assert_ne!(a.created_at, b.created_at);
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn cache_key_distinguishes_different_filters() {
    let a = SearchQuery::new("rose").with_page(1);
    let b = SearchQuery::new("rose").with_page(2);
    assert_ne!(a.cache_key(), b.cache_key());
}

#[test]
fn url_round_trip_preserves_every_set_field() {
    let query = SearchQuery::new("dragon sleeve")
        .with_styles(["japanese", "blackwork"])
        .with_location(LocationFilter::Postcode("LS1 4AB".into()))
        .with_difficulty([Difficulty::Advanced])
        .with_sort(SortBy::Rating)
        .with_page(3)
        .with_limit(40)
        .with_radius_km(25.0)
        .with_price_range(PriceRange { min: 80, max: 200 })
        .with_availability(Availability::ThisWeek)
        .with_min_rating(4.5);

    let params = query.to_query_params();
    let rebuilt = SearchQuery::from_query_params(&params).unwrap();

    assert_eq!(rebuilt.text, query.text);
    assert_eq!(rebuilt.styles, query.styles);
    assert_eq!(rebuilt.location, query.location);
    assert_eq!(rebuilt.difficulty, query.difficulty);
    assert_eq!(rebuilt.sort_by, query.sort_by);
    assert_eq!(rebuilt.page, query.page);
    assert_eq!(rebuilt.limit, query.limit);
    assert_eq!(rebuilt.radius_km, query.radius_km);
    assert_eq!(rebuilt.price_range, query.price_range);
    assert_eq!(rebuilt.availability, query.availability);
    assert_eq!(rebuilt.min_rating, query.min_rating);
    assert_eq!(rebuilt.cache_key(), query.cache_key());
}

#[test]
fn url_round_trip_of_coordinates() {
    let query =
        SearchQuery::new("").with_location(LocationFilter::Coordinates { lat: 53.8, lng: -1.55 });
    let rebuilt = SearchQuery::from_query_params(&query.to_query_params()).unwrap();
    assert_eq!(rebuilt.location, query.location);
}

#[test]
fn default_query_emits_no_params() {
    assert!(SearchQuery::new("").to_query_params().is_empty());
}

#[test]
fn malformed_params_are_validation_errors() {
    let params = vec![("page".to_string(), "not-a-number".to_string())];
    assert!(SearchQuery::from_query_params(&params).is_err());
}

#[test]
fn has_filters_reflects_content() {
    assert!(!SearchQuery::new("").has_filters());
    assert!(SearchQuery::new("rose").has_filters());
    assert!(SearchQuery::new("").with_styles(["fineline"]).has_filters());
}

#[test]
fn with_methods_do_not_mutate_the_source() {
    let base = SearchQuery::new("rose");
    let _derived = base.clone().with_styles(["fineline"]);
    assert!(base.styles.is_empty());
}

proptest! {
    #[test]
    fn cache_key_stable_under_permutation(
        mut styles in prop::collection::vec("[a-z]{1,8}", 0..6),
    ) {
        let forward = SearchQuery::new("ink").with_styles(styles.clone());
        styles.reverse();
        let backward = SearchQuery::new("ink").with_styles(styles);
        prop_assert_eq!(forward.cache_key(), backward.cache_key());
    }
}
