//! Discord webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{check_response, webhook_client, NotifyChannel};
use crate::error::ChannelError;
use crate::events::{truncate, NotifyEvent};

/// Bot name shown on posted messages.
const BOT_USERNAME: &str = "X Followers Monitor";

/// Discord rejects embed descriptions over 4096 chars; keep a margin.
const MAX_EMBED_DESC_LENGTH: usize = 4000;

/// Discord webhook notification channel.
pub struct DiscordChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl DiscordChannel {
    /// Create a Discord channel from an optional webhook URL.
    #[must_use]
    pub fn from_url(webhook_url: Option<String>) -> Self {
        let webhook_url = webhook_url.filter(|url| !url.trim().is_empty());

        if webhook_url.is_some() {
            debug!("Discord notifications enabled");
        } else {
            debug!("Discord notifications disabled (no webhook URL)");
        }

        Self {
            webhook_url,
            client: webhook_client(),
        }
    }

    /// Create a Discord channel with a specific webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self::from_url(Some(webhook_url))
    }

    /// Format an event as a Discord webhook payload.
    fn format_payload(event: &NotifyEvent) -> DiscordPayload {
        let embed = DiscordEmbed {
            title: event.title(),
            description: truncate(&event.description(), MAX_EMBED_DESC_LENGTH),
            color: event.tone().color(),
            timestamp: event.timestamp().to_rfc3339(),
            footer: Some(DiscordFooter {
                text: BOT_USERNAME.to_string(),
            }),
            fields: event
                .fields()
                .into_iter()
                .map(|(name, value)| DiscordField::inline(name, value))
                .collect(),
        };

        DiscordPayload {
            username: BOT_USERNAME.to_string(),
            embeds: vec![embed],
        }
    }
}

#[async_trait]
impl NotifyChannel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("DISCORD_WEBHOOK_URL".to_string()))?;

        let payload = Self::format_payload(event);

        debug!(channel = "discord", event_type = ?event.title(), "Sending notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;
        check_response("discord", response).await?;

        debug!(channel = "discord", "Notification sent successfully");
        Ok(())
    }
}

// =============================================================================
// Discord API types
// =============================================================================

#[derive(Debug, Serialize)]
struct DiscordPayload {
    username: String,
    embeds: Vec<DiscordEmbed>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<DiscordFooter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<DiscordField>,
}

#[derive(Debug, Serialize)]
struct DiscordFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct DiscordField {
    name: String,
    value: String,
    inline: bool,
}

impl DiscordField {
    fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}
