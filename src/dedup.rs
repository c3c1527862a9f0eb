//! Coalesces concurrent identical in-flight requests
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Slot<T> = Arc<OnceCell<Result<T>>>;

/// Guarantees at most one concurrent underlying operation per key.
///
/// Concurrent callers for the same key share a single `OnceCell`
/// initialization: the first caller's factory runs, everyone else awaits the
/// same cell and clones the settled outcome. The pending slot is removed once
/// the operation settles, success or failure, so a failed call never blocks a
/// retry.
pub struct RequestDeduplicator<T> {
    pending: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> RequestDeduplicator<T> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn execute<F, Fut>(&self, key: &str, factory: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = {
            let mut pending = self.pending.lock();
            pending
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = slot.get_or_init(factory).await.clone();

        // Drop the slot only if it is still ours; a retry may already have
        // registered a fresh one.
        let mut pending = self.pending.lock();
        if let Some(current) = pending.get(key) {
            if Arc::ptr_eq(current, &slot) {
                pending.remove(key);
            }
        }

        outcome
    }

    /// Number of keys with an unsettled operation.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// True if a request for this key is currently outstanding.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.lock().contains_key(key)
    }
}

impl<T: Clone> Default for RequestDeduplicator<T> {
    fn default() -> Self {
        Self::new()
    }
}
