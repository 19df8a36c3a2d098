//! Notification event types for the follower monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visual tone of a notification, mapped to embed/attachment colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Follower count went up
    Gain,
    /// Follower count went down
    Loss,
    /// Nothing moved
    Neutral,
    /// The monitor run itself failed
    Critical,
}

impl Tone {
    /// Get the Discord embed color for this tone.
    #[must_use]
    pub const fn color(&self) -> u32 {
        match self {
            Self::Gain => 0x002e_cc71,     // Green
            Self::Loss => 0x00e7_4c3c,     // Red
            Self::Neutral => 0x007f_8c8d,  // Grey
            Self::Critical => 0x00c0_392b, // Dark red
        }
    }

    /// Get the Slack attachment color for this tone.
    #[must_use]
    pub const fn hex(&self) -> &'static str {
        match self {
            Self::Gain => "#2ecc71",
            Self::Loss => "#e74c3c",
            Self::Neutral => "#7f8c8d",
            Self::Critical => "#c0392b",
        }
    }

    /// Get display name for this tone.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gain => "Gain",
            Self::Loss => "Loss",
            Self::Neutral => "No change",
            Self::Critical => "Critical",
        }
    }

    /// Pick the tone for a signed follower delta.
    #[must_use]
    pub const fn for_delta(delta: i64) -> Self {
        if delta > 0 {
            Self::Gain
        } else if delta < 0 {
            Self::Loss
        } else {
            Self::Neutral
        }
    }
}

/// Events that can trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifyEvent {
    /// The sampled follower count differs from the stored one
    FollowerCountChanged {
        username: String,
        previous: u64,
        current: u64,
        delta: i64,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    /// A monitor run failed before it could record a sample
    MonitorFailed {
        username: String,
        stage: String,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl NotifyEvent {
    /// Get a short title for this event type.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::FollowerCountChanged { delta, .. } => {
                if *delta > 0 {
                    format!("📈 Net Gain: {}", signed(*delta))
                } else if *delta < 0 {
                    format!("📉 Net Loss: {}", signed(*delta))
                } else {
                    "➖ No Net Change".to_string()
                }
            }
            Self::MonitorFailed { username, .. } => {
                format!("⚠️ Follower monitor failed for @{username}")
            }
        }
    }

    /// Get the tone/color for this event.
    #[must_use]
    pub const fn tone(&self) -> Tone {
        match self {
            Self::FollowerCountChanged { delta, .. } => Tone::for_delta(*delta),
            Self::MonitorFailed { .. } => Tone::Critical,
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::FollowerCountChanged { timestamp, .. } | Self::MonitorFailed { timestamp, .. } => {
                *timestamp
            }
        }
    }

    /// Human-readable body shared by all channels.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::FollowerCountChanged {
                username,
                previous,
                current,
                delta,
                ..
            } => format!(
                "@{username} now has {current} followers ({} since last check, was {previous})",
                signed(*delta)
            ),
            Self::MonitorFailed { stage, error, .. } => {
                format!("Run failed during {stage}: {error}")
            }
        }
    }

    /// Name/value pairs rendered as fields by channels that support them.
    #[must_use]
    pub fn fields(&self) -> Vec<(String, String)> {
        match self {
            Self::FollowerCountChanged {
                previous,
                current,
                delta,
                ..
            } => vec![
                ("Previous".to_string(), previous.to_string()),
                ("Current".to_string(), current.to_string()),
                ("Change".to_string(), signed(*delta)),
            ],
            Self::MonitorFailed {
                username, stage, ..
            } => vec![
                ("Account".to_string(), format!("@{username}")),
                ("Stage".to_string(), stage.clone()),
            ],
        }
    }
}

/// Render a delta with an explicit sign: `+5`, `-7`, `0`.
#[must_use]
pub fn signed(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

/// Truncate text to at most `max_chars` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(delta: i64) -> NotifyEvent {
        NotifyEvent::FollowerCountChanged {
            username: "rustlang".to_string(),
            previous: 100,
            current: (100 + delta) as u64,
            delta,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(5), "+5");
        assert_eq!(signed(-7), "-7");
        assert_eq!(signed(0), "0");
    }

    #[test]
    fn test_titles_carry_signed_delta() {
        assert_eq!(changed(5).title(), "📈 Net Gain: +5");
        assert_eq!(changed(-7).title(), "📉 Net Loss: -7");
        assert_eq!(changed(0).title(), "➖ No Net Change");
    }

    #[test]
    fn test_tones() {
        assert_eq!(changed(5).tone(), Tone::Gain);
        assert_eq!(changed(-2).tone(), Tone::Loss);
        assert_eq!(changed(0).tone(), Tone::Neutral);
        assert_eq!(Tone::Gain.color(), 0x002e_cc71);
        assert_eq!(Tone::Loss.color(), 0x00e7_4c3c);
    }

    #[test]
    fn test_description_mentions_counts() {
        let description = changed(5).description();
        assert!(description.contains("@rustlang"));
        assert!(description.contains("105 followers"));
        assert!(description.contains("+5"));
        assert!(description.contains("was 100"));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(changed(-7)).unwrap();
        assert_eq!(json["type"], "follower_count_changed");
        assert_eq!(json["delta"], -7);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }
}
