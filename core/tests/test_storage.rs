#[cfg(test)]
mod storage_tests {
    use std::fs;
    use std::sync::Arc;

    use river_core::constants::storage_keys::{TRACE_ID, USER_ID};
    use river_core::plugins::IdPlugin;
    use river_core::storage::{FileStore, KeyValueStore, MemoryStore};
    use river_core::types::StorageError;
    use tempfile::tempdir;

    // ------------------------------------------------------------
    // FileStore
    // ------------------------------------------------------------

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("river.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("river.json");

        {
            let store = FileStore::open(&path).unwrap();
            store.set("a", "1").unwrap();
            store.set("b", "2").unwrap();
            store.remove("a").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("a").unwrap(), None);
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("2"));
        assert!(!path.with_extension("tmp").exists(), "temp file is renamed away");
    }

    #[test]
    fn on_disk_format_is_a_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("river.json");
        let store = FileStore::open(&path).unwrap();
        store.set(USER_ID, "abc").unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "river-userId": "abc" }));
    }

    #[test]
    fn removing_unknown_key_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("river.json");
        let store = FileStore::open(&path).unwrap();
        store.remove("nope").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("river.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StorageError::Corrupt(_))));
    }

    // ------------------------------------------------------------
    // MemoryStore
    // ------------------------------------------------------------

    #[test]
    fn memory_store_round_trips_and_removes() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    // ------------------------------------------------------------
    // Ids
    // ------------------------------------------------------------

    #[test]
    fn visitor_id_is_stable_across_restarts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("visitor.json");

        let first = {
            let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
            IdPlugin::new(store, Arc::new(MemoryStore::new())).visitor_id().unwrap()
        };
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        assert_eq!(store.get(USER_ID).unwrap().as_deref(), Some(first.as_str()));
        let again = IdPlugin::new(store, Arc::new(MemoryStore::new())).visitor_id().unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn stored_visitor_id_wins_over_fingerprint() {
        let visitor = Arc::new(MemoryStore::new());
        visitor.set(USER_ID, "from-a-previous-run").unwrap();
        let plugin = IdPlugin::new(visitor, Arc::new(MemoryStore::new()));
        assert_eq!(plugin.visitor_id().unwrap(), "from-a-previous-run");
    }

    #[test]
    fn trace_id_is_per_session() {
        let session = Arc::new(MemoryStore::new());
        let plugin = IdPlugin::new(Arc::new(MemoryStore::new()), session.clone());

        let trace = plugin.trace_id().unwrap();
        assert_eq!(trace.len(), 10);
        assert_eq!(plugin.trace_id().unwrap(), trace);
        assert_eq!(session.get(TRACE_ID).unwrap(), Some(trace.clone()));

        let other_session = IdPlugin::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()));
        assert_ne!(other_session.trace_id().unwrap(), trace);
    }
}
