//! Persistent state store.
//!
//! A single JSON document holds the last known count and the snapshot
//! history; each run also drops a timestamped snapshot file into a
//! history directory.

mod file;
mod history;
mod snapshot;

pub use file::{StateStore, LATEST_FILE};
pub use history::HistoryStore;
pub use snapshot::{ArchivedSnapshot, FollowerSnapshot};
