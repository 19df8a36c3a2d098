//! JSON file persistence for the follower history.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::{ArchivedSnapshot, FollowerSnapshot, HistoryStore};
use crate::error::StoreError;

/// Name of the snapshot mirror inside the history directory.
pub const LATEST_FILE: &str = "latest.json";

/// File-backed state store.
///
/// Owns the main history document and a directory of per-run snapshot
/// files. The process is the only writer for the duration of a run.
#[derive(Debug, Clone)]
pub struct StateStore {
    /// Path to the history document.
    state_path: PathBuf,
    /// Directory receiving timestamped snapshot files.
    history_dir: PathBuf,
}

impl StateStore {
    /// Create a store for the given document and history directory.
    pub fn new(state_path: impl Into<PathBuf>, history_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_path: state_path.into(),
            history_dir: history_dir.into(),
        }
    }

    /// Path to the history document.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Directory receiving snapshot files.
    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    /// Load the history, or an empty default if the file does not exist.
    pub fn load(&self) -> Result<HistoryStore, StoreError> {
        let content = match std::fs::read_to_string(&self.state_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.state_path.display(), "No state file, starting empty");
                return Ok(HistoryStore::default());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.state_path.clone(),
                    source,
                })
            }
        };

        let mut store: HistoryStore =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.state_path.clone(),
                source,
            })?;
        store.reconcile();

        tracing::debug!(
            path = %self.state_path.display(),
            snapshots = store.len(),
            last_count = store.last_count,
            "Loaded state"
        );
        Ok(store)
    }

    /// Atomically replace the history document.
    pub fn save(&self, store: &HistoryStore) -> Result<(), StoreError> {
        write_json_atomic(&self.state_path, store)?;
        tracing::debug!(
            path = %self.state_path.display(),
            snapshots = store.len(),
            "Saved state"
        );
        Ok(())
    }

    /// Write the snapshot to its timestamped file and to `latest.json`.
    ///
    /// Returns the path of the timestamped file.
    pub fn archive(
        &self,
        username: &str,
        snapshot: FollowerSnapshot,
    ) -> Result<PathBuf, StoreError> {
        let archived = ArchivedSnapshot::new(username, snapshot);
        let path = self.history_dir.join(archived.file_name());

        write_json_atomic(&path, &archived)?;
        if let Err(e) = write_json_atomic(&self.history_dir.join(LATEST_FILE), &archived) {
            // No snapshot file without a matching latest.json
            if let Err(cleanup) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove orphan snapshot");
            }
            return Err(e);
        }

        tracing::debug!(path = %path.display(), "Archived snapshot");
        Ok(path)
    }

    /// Read `latest.json` from the history directory, if present.
    pub fn latest_archived(&self) -> Result<Option<ArchivedSnapshot>, StoreError> {
        let path = self.history_dir.join(LATEST_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|source| StoreError::Parse { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }
}

/// Serialize `value` as pretty JSON and rename it over `path`.
///
/// The temporary file lives in the target directory so the final rename
/// never crosses filesystems.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(content.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn setup() -> (TempDir, StateStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(
            temp_dir.path().join("followers_data.json"),
            temp_dir.path().join("followers_history"),
        );
        (temp_dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = setup();
        let history = store.load().unwrap();
        assert!(history.is_empty());
        assert_eq!(history.last_count, 0);
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store) = setup();
        let mut history = HistoryStore::for_user("rustlang");
        history.record(100, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        store.save(&history).unwrap();
        assert_eq!(store.load().unwrap(), history);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(
            temp_dir.path().join("nested/deeper/state.json"),
            temp_dir.path().join("history"),
        );

        store.save(&HistoryStore::default()).unwrap();
        assert!(store.state_path().exists());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let (_dir, store) = setup();
        std::fs::write(store.state_path(), "not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn test_load_reconciles_last_count() {
        let (_dir, store) = setup();
        std::fs::write(
            store.state_path(),
            r#"{"last_count": 3, "history": [{"timestamp": "2026-01-01T00:00:00Z", "count": 9}]}"#,
        )
        .unwrap();

        let history = store.load().unwrap();
        assert_eq!(history.last_count, 9);
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let (dir, _) = setup();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = StateStore::new(blocker.join("state.json"), dir.path().join("history"));

        let err = store.save(&HistoryStore::default()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
    }

    #[test]
    fn test_archive_writes_snapshot_and_latest() {
        let (_dir, store) = setup();
        let snapshot =
            FollowerSnapshot::new(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap(), 321);

        let path = store.archive("rustlang", snapshot).unwrap();
        assert!(path.ends_with("followers_20260203_040506.json"));
        assert!(path.exists());

        let latest = store.latest_archived().unwrap().unwrap();
        assert_eq!(latest.username, "rustlang");
        assert_eq!(latest.count, 321);
    }

    #[test]
    fn test_archive_failure_leaves_no_orphan_snapshot() {
        let (_dir, store) = setup();
        // A directory in place of latest.json makes the mirror write fail.
        std::fs::create_dir_all(store.history_dir().join(LATEST_FILE)).unwrap();
        let snapshot =
            FollowerSnapshot::new(Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap(), 321);

        let err = store.archive("rustlang", snapshot).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        let entries: Vec<_> = std::fs::read_dir(store.history_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(LATEST_FILE)]);
    }
}
