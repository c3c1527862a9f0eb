use inksearch::cache::SearchCache;
use std::time::Duration;

#[test]
fn set_then_get_returns_the_value() {
    let cache: SearchCache<Vec<u32>> = SearchCache::new(10, Duration::from_secs(60));
    cache.put("key", vec![1, 2, 3]);
    assert_eq!(cache.get("key"), Some(vec![1, 2, 3]));
}

#[test]
fn get_after_ttl_returns_none_and_deletes() {
    let cache: SearchCache<u8> = SearchCache::new(10, Duration::from_millis(20));
    cache.put("key", 1);
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(cache.get("key"), None);
    assert!(cache.is_empty());
}

#[test]
fn eviction_targets_least_recently_accessed_only() {
    let cache: SearchCache<u8> = SearchCache::new(3, Duration::from_secs(60));
    cache.put("a", 1);
    std::thread::sleep(Duration::from_millis(3));
    cache.put("b", 2);
    std::thread::sleep(Duration::from_millis(3));
    cache.put("c", 3);
    std::thread::sleep(Duration::from_millis(3));

    // Refresh "a" and "b"; "c" becomes the eviction candidate.
    cache.get("a");
    std::thread::sleep(Duration::from_millis(3));
    cache.get("b");
    std::thread::sleep(Duration::from_millis(3));

    cache.put("d", 4);

    assert_eq!(cache.get("c"), None);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("d"), Some(4));
}

#[test]
fn overwriting_an_existing_key_does_not_evict() {
    let cache: SearchCache<u8> = SearchCache::new(2, Duration::from_secs(60));
    cache.put("a", 1);
    cache.put("b", 2);
    cache.put("a", 9);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 0);
    assert_eq!(cache.get("a"), Some(9));
}

#[test]
fn stats_track_hits_and_misses() {
    let cache: SearchCache<u8> = SearchCache::new(2, Duration::from_secs(60));
    cache.put("a", 1);
    cache.get("a");
    cache.get("a");
    cache.get("missing");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn sweeper_purges_without_access() {
    let cache: std::sync::Arc<SearchCache<u8>> =
        std::sync::Arc::new(SearchCache::new(10, Duration::from_millis(10)));
    cache.put("a", 1);
    cache.put("b", 2);

    let handle = cache.spawn_sweeper(Duration::from_millis(15));
    tokio::time::sleep(Duration::from_millis(60)).await;
    handle.abort();

    assert!(cache.is_empty());
    assert_eq!(cache.stats().expired, 2);
}
