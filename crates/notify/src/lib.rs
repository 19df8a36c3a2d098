//! Webhook notifications for follower count changes.
//!
//! This crate sends follower-change and run-failure alerts to Discord,
//! Slack, and other messaging platforms.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{Notifier, NotifyEvent};
//!
//! # async fn example() {
//! let notifier = Notifier::from_urls(
//!     Some("https://discord.com/api/webhooks/...".to_string()),
//!     None,
//!     false,
//! );
//!
//! let results = notifier
//!     .dispatch(&NotifyEvent::FollowerCountChanged {
//!         username: "rustlang".to_string(),
//!         previous: 100,
//!         current: 105,
//!         delta: 5,
//!         timestamp: chrono::Utc::now(),
//!     })
//!     .await;
//! # }
//! ```
//!
//! # Architecture
//!
//! The notification system uses a trait-based channel design:
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`DiscordChannel`] and [`SlackChannel`] implement webhook delivery
//! - [`Notifier`] dispatches events to all enabled channels

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;

pub use channels::discord::DiscordChannel;
pub use channels::slack::SlackChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{signed, NotifyEvent, Tone};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of delivering one event to one channel.
pub type Delivery = (String, Result<(), ChannelError>);

/// Central notification dispatcher.
///
/// The `Notifier` manages multiple notification channels and delivers
/// events to every enabled channel, collecting per-channel results.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier from optional webhook URLs.
    ///
    /// Channels without a URL are left out; `disabled` turns every
    /// channel off regardless of configuration.
    #[must_use]
    pub fn from_urls(
        discord_webhook_url: Option<String>,
        slack_webhook_url: Option<String>,
        disabled: bool,
    ) -> Self {
        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];

        let discord = DiscordChannel::from_url(discord_webhook_url);
        if discord.enabled() {
            info!("Discord notifications enabled");
            channels.push(Arc::new(discord));
        }

        let slack = SlackChannel::from_url(slack_webhook_url);
        if slack.enabled() {
            info!("Slack notifications enabled");
            channels.push(Arc::new(slack));
        }

        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send an event to every enabled channel and wait for each delivery.
    ///
    /// Channels are tried in order; a failing channel does not stop the
    /// others. Errors are logged and returned, never propagated.
    pub async fn dispatch(&self, event: &NotifyEvent) -> Vec<Delivery> {
        if self.disabled {
            debug!("Notifications disabled, skipping event");
            return vec![];
        }

        if self.channels.is_empty() {
            debug!("No channels configured, skipping event");
            return vec![];
        }

        let mut results = vec![];

        for channel in &self.channels {
            let channel_name = channel.name();

            if !channel.enabled() {
                debug!(channel = channel_name, "Channel disabled, skipping");
                continue;
            }

            let result = channel.send(event).await;
            match &result {
                Ok(()) => info!(channel = channel_name, "Notification sent"),
                Err(e) => error!(
                    channel = channel_name,
                    error = %e,
                    "Failed to send notification"
                ),
            }
            results.push((channel_name.to_string(), result));
        }

        results
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::disabled()
    }
}
