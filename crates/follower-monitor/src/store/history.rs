//! Follower history document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FollowerSnapshot;

/// Last known count plus the append-only list of snapshots.
///
/// Invariants: `history` is non-decreasing in timestamp and `last_count`
/// equals the count of the last snapshot (0 while history is empty).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryStore {
    /// Profile the history belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Count of the most recent snapshot.
    #[serde(default)]
    pub last_count: u64,
    /// Chronological snapshots, oldest first.
    #[serde(default)]
    pub history: Vec<FollowerSnapshot>,
}

impl HistoryStore {
    /// Create an empty history for a profile.
    #[must_use]
    pub fn for_user(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::default()
        }
    }

    /// Whether no sample has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Number of recorded snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Most recent snapshot, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&FollowerSnapshot> {
        self.history.last()
    }

    /// Count to diff against, or `None` on a baseline run.
    #[must_use]
    pub fn previous_count(&self) -> Option<u64> {
        self.latest().map(|s| s.count)
    }

    /// Append a snapshot taken at `now` and return it.
    ///
    /// A clock reading earlier than the last snapshot is clamped to the
    /// last snapshot's timestamp so the history stays ordered.
    pub fn record(&mut self, count: u64, now: DateTime<Utc>) -> FollowerSnapshot {
        let timestamp = match self.latest() {
            Some(last) if last.timestamp > now => {
                tracing::warn!(
                    last = %last.timestamp,
                    now = %now,
                    "Clock went backwards, clamping snapshot timestamp"
                );
                last.timestamp
            }
            _ => now,
        };

        let snapshot = FollowerSnapshot::new(timestamp, count);
        self.history.push(snapshot);
        self.last_count = count;
        snapshot
    }

    /// Restore `last_count` from the history if the two disagree.
    ///
    /// Returns `true` when a repair was made.
    pub fn reconcile(&mut self) -> bool {
        let expected = self.previous_count().unwrap_or(0);
        if self.last_count == expected {
            return false;
        }

        tracing::warn!(
            stored = self.last_count,
            expected,
            "last_count disagrees with history, using latest snapshot"
        );
        self.last_count = expected;
        true
    }

    /// Whether timestamps are non-decreasing and `last_count` matches.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let ordered = self
            .history
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp);
        ordered && self.last_count == self.previous_count().unwrap_or(0)
    }

    /// Snapshots paired with the delta from their predecessor, newest first.
    #[must_use]
    pub fn recent_with_deltas(&self, limit: usize) -> Vec<(FollowerSnapshot, Option<i64>)> {
        let mut rows: Vec<_> = self
            .history
            .iter()
            .enumerate()
            .map(|(i, snapshot)| {
                let delta = i
                    .checked_sub(1)
                    .and_then(|prev| self.history.get(prev))
                    .map(|prev| crate::differ::diff(snapshot.count, prev.count));
                (*snapshot, delta)
            })
            .collect();
        rows.reverse();
        rows.truncate(limit);
        rows
    }
}
