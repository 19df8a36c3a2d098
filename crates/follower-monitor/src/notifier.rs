//! Delta notifications for one monitored profile.

use chrono::Utc;
use notify::{Notifier, NotifyEvent};

/// What happened to a notification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Delta was zero; nothing to announce.
    Unchanged,
    /// No channel is configured or notifications are disabled.
    NoChannels,
    /// Every channel accepted the message.
    Sent { channels: usize },
    /// At least one channel failed; the messages describe each failure.
    Failed { errors: Vec<String> },
}

impl NotifyOutcome {
    /// Whether a message went out to at least one channel attempt.
    #[must_use]
    pub fn attempted(&self) -> bool {
        matches!(self, Self::Sent { .. } | Self::Failed { .. })
    }
}

/// Announces follower deltas for a single account.
pub struct ChangeNotifier {
    username: String,
    notifier: Notifier,
}

impl ChangeNotifier {
    /// Create a notifier for `username` on top of a channel dispatcher.
    pub fn new(username: impl Into<String>, notifier: Notifier) -> Self {
        Self {
            username: username.into(),
            notifier,
        }
    }

    /// Announce `delta`, which moved the count to `new_count`.
    ///
    /// A zero delta is a no-op. Delivery failures are logged and reported
    /// in the outcome, never returned as errors.
    pub async fn notify(&self, delta: i64, new_count: u64) -> NotifyOutcome {
        if delta == 0 {
            tracing::debug!("Follower count unchanged, no notification");
            return NotifyOutcome::Unchanged;
        }

        if !self.notifier.has_channels() {
            tracing::debug!("No notification channels configured, skipping");
            return NotifyOutcome::NoChannels;
        }

        let previous = u64::try_from(i128::from(new_count) - i128::from(delta)).unwrap_or(0);
        let event = NotifyEvent::FollowerCountChanged {
            username: self.username.clone(),
            previous,
            current: new_count,
            delta,
            timestamp: Utc::now(),
        };

        self.deliver(&event).await
    }

    /// Report a fatal run error to the channels.
    pub async fn alert_failure(&self, stage: &str, error: &str) -> NotifyOutcome {
        if !self.notifier.has_channels() {
            return NotifyOutcome::NoChannels;
        }

        let event = NotifyEvent::MonitorFailed {
            username: self.username.clone(),
            stage: stage.to_string(),
            error: error.to_string(),
            timestamp: Utc::now(),
        };

        self.deliver(&event).await
    }

    async fn deliver(&self, event: &NotifyEvent) -> NotifyOutcome {
        let results = self.notifier.dispatch(event).await;
        let sent = results.iter().filter(|(_, r)| r.is_ok()).count();
        let errors: Vec<String> = results
            .into_iter()
            .filter_map(|(channel, r)| r.err().map(|e| format!("{channel}: {e}")))
            .collect();

        if errors.is_empty() {
            NotifyOutcome::Sent { channels: sent }
        } else {
            tracing::error!(failed = errors.len(), sent, "Notification delivery failed");
            NotifyOutcome::Failed { errors }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use notify::{ChannelError, NotifyChannel};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingChannel {
        events: Mutex<Vec<NotifyEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn enabled(&self) -> bool {
            true
        }

        async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                Err(ChannelError::NotConfigured("recording".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn notifier_with(channel: Arc<RecordingChannel>) -> ChangeNotifier {
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![channel];
        ChangeNotifier::new("rustlang", Notifier::with_channels(channels))
    }

    #[tokio::test]
    async fn test_zero_delta_is_noop() {
        let channel = Arc::new(RecordingChannel::default());
        let outcome = notifier_with(channel.clone()).notify(0, 100).await;

        assert_eq!(outcome, NotifyOutcome::Unchanged);
        assert!(channel.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_positive_delta_sends_event() {
        let channel = Arc::new(RecordingChannel::default());
        let outcome = notifier_with(channel.clone()).notify(5, 105).await;

        assert_eq!(outcome, NotifyOutcome::Sent { channels: 1 });
        let events = channel.events.lock().unwrap();
        match &events[0] {
            NotifyEvent::FollowerCountChanged {
                previous,
                current,
                delta,
                ..
            } => {
                assert_eq!((*previous, *current, *delta), (100, 105, 5));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(events[0].title().contains("+5"));
    }

    #[tokio::test]
    async fn test_channel_failure_is_reported_not_raised() {
        let channel = Arc::new(RecordingChannel {
            fail: true,
            ..RecordingChannel::default()
        });
        let outcome = notifier_with(channel).notify(-7, 98).await;

        match outcome {
            NotifyOutcome::Failed { errors } => assert!(errors[0].starts_with("recording:")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_disabled_notifier_reports_no_channels() {
        let notifier = ChangeNotifier::new("rustlang", Notifier::disabled());
        assert_eq!(notifier.notify(3, 10).await, NotifyOutcome::NoChannels);
        assert_eq!(
            notifier.alert_failure("sample", "boom").await,
            NotifyOutcome::NoChannels
        );
    }
}
