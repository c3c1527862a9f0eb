//! TTL and capacity bounded result cache keyed by canonical query strings
use crate::config::CacheConfig;
use crate::model::SearchResults;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache entry with creation and access timestamps.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            last_accessed: now,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Counters exposed for monitoring and aggregate recommendations.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expired: u64,
}

/// TTL + capacity bounded store of prior search results.
///
/// Expiry is lazy on `get`; a periodic sweep purges expired entries even
/// under inactivity. At capacity the entry with the oldest `last_accessed`
/// is evicted by linear scan, a deliberate simplification at the default
/// capacity of 100.
pub struct SearchCache<V = SearchResults> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone + Send + 'static> SearchCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expired: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    /// Returns the cached value, refreshing its access time. Expired entries
    /// are deleted on access and reported as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(self.ttl),
            None => {
                inner.misses += 1;
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            inner.expired += 1;
            inner.misses += 1;
            return None;
        }

        let value = inner.entries.get_mut(key).map(|entry| {
            entry.last_accessed = Instant::now();
            entry.value.clone()
        });
        inner.hits += 1;
        value
    }

    /// Inserts a value, evicting the least-recently-accessed entry first if
    /// the cache is at capacity.
    pub fn put(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let lru_key = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(k, _)| k.clone());
            if let Some(lru_key) = lru_key {
                inner.entries.remove(&lru_key);
                inner.evictions += 1;
            }
        }

        inner.entries.insert(key, CacheEntry::new(value));
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.inner.lock().entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Purge every expired entry regardless of access pattern.
    pub fn sweep_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - inner.entries.len();
        inner.expired += removed as u64;
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expired: inner.expired,
        }
    }
}

impl<V: Clone + Send + Sync + 'static> SearchCache<V> {
    /// Spawn the periodic expiry sweep on the current tokio runtime.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired();
                if removed > 0 {
                    log::debug!("cache sweep removed {removed} expired entries");
                }
            }
        })
    }
}
