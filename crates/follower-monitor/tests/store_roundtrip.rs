use chrono::{DateTime, Utc};
use follower_monitor::store::{HistoryStore, StateStore};
use proptest::prelude::*;
use tempfile::TempDir;

fn history_from(samples: &[(i64, u64)], username: Option<&str>) -> HistoryStore {
    let mut history = username.map_or_else(HistoryStore::default, HistoryStore::for_user);
    for &(secs, count) in samples {
        let at = DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default();
        history.record(count, at);
    }
    history
}

proptest! {
    #[test]
    fn save_then_load_is_identity(
        samples in prop::collection::vec((1_600_000_000i64..1_900_000_000, any::<u64>()), 0..20),
        named in any::<bool>(),
    ) {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("state.json"), dir.path().join("history"));
        let history = history_from(&samples, named.then_some("rustlang"));

        store.save(&history).unwrap();
        let loaded = store.load().unwrap();

        prop_assert_eq!(&loaded, &history);
        prop_assert!(loaded.is_consistent());

        // saving what was loaded yields the same document
        store.save(&loaded).unwrap();
        prop_assert_eq!(store.load().unwrap(), history);
    }
}

#[test]
fn test_document_shape_is_stable() {
    let dir = TempDir::new().unwrap();
    let store = StateStore::new(dir.path().join("state.json"), dir.path().join("history"));
    let history = history_from(&[(1_767_225_600, 100)], None);

    store.save(&history).unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(store.state_path()).unwrap()).unwrap();

    assert_eq!(raw["last_count"], 100);
    assert_eq!(raw["history"][0]["count"], 100);
    assert_eq!(raw["history"][0]["timestamp"], "2026-01-01T00:00:00Z");
    assert!(raw.get("username").is_none());
}
