//! Follower snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped observation of the follower count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerSnapshot {
    /// When the count was sampled (RFC 3339 on disk).
    pub timestamp: DateTime<Utc>,
    /// Sampled follower count.
    pub count: u64,
}

impl FollowerSnapshot {
    /// Create a snapshot for the given instant.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, count: u64) -> Self {
        Self { timestamp, count }
    }
}

/// Snapshot file written to the history directory on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedSnapshot {
    /// Monitored profile.
    pub username: String,
    /// When the count was sampled.
    pub timestamp: DateTime<Utc>,
    /// Sampled follower count.
    pub count: u64,
}

impl ArchivedSnapshot {
    /// Attach the monitored username to a snapshot.
    #[must_use]
    pub fn new(username: &str, snapshot: FollowerSnapshot) -> Self {
        Self {
            username: username.to_string(),
            timestamp: snapshot.timestamp,
            count: snapshot.count,
        }
    }

    /// File name for this snapshot inside the history directory.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("followers_{}.json", self.timestamp.format("%Y%m%d_%H%M%S"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_serializes_as_iso8601() {
        let snapshot = FollowerSnapshot::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 5).unwrap(), 42);
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["timestamp"], "2026-03-01T12:00:05Z");
        assert_eq!(json["count"], 42);
    }

    #[test]
    fn test_archive_file_name() {
        let snapshot = FollowerSnapshot::new(Utc.with_ymd_and_hms(2026, 3, 1, 7, 4, 9).unwrap(), 1);
        let archived = ArchivedSnapshot::new("rustlang", snapshot);
        assert_eq!(archived.file_name(), "followers_20260301_070409.json");
    }
}
