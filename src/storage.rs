//! Minimal key-value persistence behind which history, analytics and A/B
//! state live. Production uses a JSON-file store; tests use the in-memory
//! double. Core logic is persistence-agnostic.
use crate::error::{Result, SearchError};
use log::warn;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Namespaced string payload store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, namespace: &str) -> Result<Option<String>>;
    fn set(&self, namespace: &str, payload: &str) -> Result<()>;
    fn remove(&self, namespace: &str) -> Result<()>;
}

/// In-memory store, used as the default and as the test double.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(namespace).cloned())
    }

    fn set(&self, namespace: &str, payload: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(namespace.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        self.entries.lock().remove(namespace);
        Ok(())
    }
}

/// One JSON file per namespace under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| SearchError::Storage(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, namespace: &str) -> Result<Option<String>> {
        let path = self.path_for(namespace);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| SearchError::Storage(format!("{}: {e}", path.display())))
    }

    fn set(&self, namespace: &str, payload: &str) -> Result<()> {
        let path = self.path_for(namespace);
        fs::write(&path, payload)
            .map_err(|e| SearchError::Storage(format!("{}: {e}", path.display())))
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        let path = self.path_for(namespace);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| SearchError::Storage(format!("{}: {e}", path.display())))?;
        }
        Ok(())
    }
}

/// Load and deserialize a namespace, degrading to the default on any read or
/// parse failure. Corrupted persisted state must never break a search.
pub fn load_or_default<T>(store: &dyn KeyValueStore, namespace: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    match store.get(namespace) {
        Ok(Some(payload)) => match serde_json::from_str(&payload) {
            Ok(value) => value,
            Err(e) => {
                warn!("corrupted payload in namespace {namespace}, starting empty: {e}");
                T::default()
            }
        },
        Ok(None) => T::default(),
        Err(e) => {
            warn!("failed to read namespace {namespace}, starting empty: {e}");
            T::default()
        }
    }
}

/// Serialize and persist a namespace, logging failures instead of
/// propagating them. Telemetry persistence is best-effort.
pub fn save_best_effort<T: serde::Serialize>(store: &dyn KeyValueStore, namespace: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(payload) => {
            if let Err(e) = store.set(namespace, &payload) {
                warn!("failed to persist namespace {namespace}: {e}");
            }
        }
        Err(e) => warn!("failed to serialize namespace {namespace}: {e}"),
    }
}
