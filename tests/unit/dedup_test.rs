use inksearch::dedup::RequestDeduplicator;
use inksearch::error::SearchError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn concurrent_calls_invoke_the_factory_exactly_once() {
    let dedup = Arc::new(RequestDeduplicator::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let spawn_call = |dedup: Arc<RequestDeduplicator<String>>, calls: Arc<AtomicUsize>| {
        tokio::spawn(async move {
            dedup
                .execute("k1", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("shared".to_string())
                })
                .await
        })
    };

    let first = spawn_call(Arc::clone(&dedup), Arc::clone(&calls));
    let second = spawn_call(Arc::clone(&dedup), Arc::clone(&calls));

    assert_eq!(first.await.unwrap().unwrap(), "shared");
    assert_eq!(second.await.unwrap().unwrap(), "shared");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(dedup.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_is_shared_and_clears_the_pending_marker() {
    let dedup = Arc::new(RequestDeduplicator::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let failing = |dedup: Arc<RequestDeduplicator<String>>, calls: Arc<AtomicUsize>| {
        tokio::spawn(async move {
            dedup
                .execute("k1", || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(SearchError::Network("connection reset".to_string()))
                })
                .await
        })
    };

    let first = failing(Arc::clone(&dedup), Arc::clone(&calls));
    let second = failing(Arc::clone(&dedup), Arc::clone(&calls));

    let e1 = first.await.unwrap().unwrap_err();
    let e2 = second.await.unwrap().unwrap_err();
    assert_eq!(e1, e2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!dedup.is_pending("k1"));

    // A fresh attempt after settlement runs the factory again.
    let calls2 = Arc::clone(&calls);
    let retry = dedup
        .execute("k1", || async move {
            calls2.fetch_add(1, Ordering::SeqCst);
            Ok("recovered".to_string())
        })
        .await;
    assert_eq!(retry.unwrap(), "recovered");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn different_keys_do_not_coalesce() {
    let dedup = RequestDeduplicator::<u32>::new();
    let calls = AtomicUsize::new(0);

    let a = dedup
        .execute("a", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        })
        .await
        .unwrap();
    let b = dedup
        .execute("b", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(2)
        })
        .await
        .unwrap();

    assert_eq!((a, b), (1, 2));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
