use inksearch::storage::{JsonFileStore, KeyValueStore};
use tempfile::TempDir;

#[test]
fn json_file_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path()).unwrap();

    assert_eq!(store.get("history").unwrap(), None);
    store.set("history", r#"[{"id":"1"}]"#).unwrap();
    assert_eq!(store.get("history").unwrap().as_deref(), Some(r#"[{"id":"1"}]"#));

    store.remove("history").unwrap();
    assert_eq!(store.get("history").unwrap(), None);
}

#[test]
fn namespaces_are_independent_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path()).unwrap();

    store.set("history", "[]").unwrap();
    store.set("analytics", "{}").unwrap();

    assert!(dir.path().join("history.json").exists());
    assert!(dir.path().join("analytics.json").exists());
}
