use inksearch::config::DebounceConfig;
use inksearch::debounce::{DebouncePhase, DebouncedSearchExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn config(idle_ms: u64, max_wait_ms: u64) -> DebounceConfig {
    DebounceConfig {
        idle_window_ms: idle_ms,
        max_wait_ms,
    }
}

fn counting_executor(
    cfg: &DebounceConfig,
    runs: Arc<AtomicUsize>,
    seen: Arc<parking_lot::Mutex<Vec<u32>>>,
) -> Arc<DebouncedSearchExecutor<u32, u32>> {
    Arc::new(DebouncedSearchExecutor::wrap(cfg, move |arg: u32| {
        let runs = Arc::clone(&runs);
        let seen = Arc::clone(&seen);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            seen.lock().push(arg);
            Ok(arg)
        }
    }))
}

#[tokio::test(start_paused = true)]
async fn rapid_calls_collapse_to_one_execution_with_last_args() {
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let exec = counting_executor(&config(100, 1000), Arc::clone(&runs), Arc::clone(&seen));

    let mut handles = Vec::new();
    for i in 0..3u32 {
        let exec = Arc::clone(&exec);
        handles.push(tokio::spawn(async move { exec.call(i).await }));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().as_slice(), &[2]);
    assert_eq!(outcomes, vec![None, None, Some(2)]);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_window_prevents_execution() {
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let exec = counting_executor(&config(100, 1000), Arc::clone(&runs), seen);

    let handle = {
        let exec = Arc::clone(&exec);
        tokio::spawn(async move { exec.call(7).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(exec.phase(), DebouncePhase::Pending);
    exec.cancel();

    assert_eq!(handle.await.unwrap().unwrap(), None);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert_eq!(exec.phase(), DebouncePhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn flush_forces_immediate_execution() {
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let exec = counting_executor(&config(10_000, 60_000), Arc::clone(&runs), Arc::clone(&seen));

    let handle = {
        let exec = Arc::clone(&exec);
        tokio::spawn(async move { exec.call(9).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    exec.flush();

    assert_eq!(handle.await.unwrap().unwrap(), Some(9));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(seen.lock().as_slice(), &[9]);
}

#[tokio::test(start_paused = true)]
async fn max_wait_forces_execution_under_sustained_input() {
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    // Idle window longer than the gap between calls: only the ceiling fires.
    let exec = counting_executor(&config(100, 250), Arc::clone(&runs), Arc::clone(&seen));

    let mut handles = Vec::new();
    for i in 0..4u32 {
        let exec = Arc::clone(&exec);
        handles.push(tokio::spawn(async move { exec.call(i).await }));
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    let mut executed = Vec::new();
    for handle in handles {
        if let Some(v) = handle.await.unwrap().unwrap() {
            executed.push(v);
        }
    }

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(executed, vec![3]);
    assert_eq!(seen.lock().as_slice(), &[3]);
}

#[tokio::test(start_paused = true)]
async fn executor_is_reusable_after_a_burst() {
    let runs = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let exec = counting_executor(&config(50, 500), Arc::clone(&runs), Arc::clone(&seen));

    assert_eq!(exec.call(1).await.unwrap(), Some(1));
    assert_eq!(exec.call(2).await.unwrap(), Some(2));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    assert_eq!(seen.lock().as_slice(), &[1, 2]);
}
