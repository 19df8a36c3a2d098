//! Slack webhook notification channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{check_response, webhook_client, NotifyChannel};
use crate::error::ChannelError;
use crate::events::NotifyEvent;

/// Slack webhook notification channel.
pub struct SlackChannel {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

impl SlackChannel {
    /// Create a Slack channel from an optional webhook URL.
    #[must_use]
    pub fn from_url(webhook_url: Option<String>) -> Self {
        let webhook_url = webhook_url.filter(|url| !url.trim().is_empty());

        if webhook_url.is_some() {
            debug!("Slack notifications enabled");
        } else {
            debug!("Slack notifications disabled (no webhook URL)");
        }

        Self {
            webhook_url,
            client: webhook_client(),
        }
    }

    /// Create a Slack channel with a specific webhook URL.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        Self::from_url(Some(webhook_url))
    }

    /// Format an event as a Slack webhook payload.
    fn format_payload(event: &NotifyEvent) -> SlackPayload {
        let fields = event
            .fields()
            .into_iter()
            .map(|(title, value)| SlackField {
                title,
                value,
                short: true,
            })
            .collect();

        let attachment = SlackAttachment {
            fallback: format!("{} - {}", event.title(), event.description()),
            color: event.tone().hex().to_string(),
            author_name: Some("X Followers Monitor".to_string()),
            title: event.title(),
            text: event.description(),
            fields,
            footer: Some(format!(
                "{} | {}",
                event.tone().as_str(),
                event.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
            )),
            ts: Some(event.timestamp().timestamp()),
        };

        SlackPayload {
            attachments: vec![attachment],
        }
    }
}

#[async_trait]
impl NotifyChannel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let webhook_url = self
            .webhook_url
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured("SLACK_WEBHOOK_URL".to_string()))?;

        let payload = Self::format_payload(event);

        debug!(channel = "slack", event_type = ?event.title(), "Sending notification");

        let response = self.client.post(webhook_url).json(&payload).send().await?;
        check_response("slack", response).await?;

        debug!(channel = "slack", "Notification sent successfully");
        Ok(())
    }
}

// =============================================================================
// Slack API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SlackPayload {
    attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment {
    fallback: String,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<String>,
    title: String,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<SlackField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SlackField {
    title: String,
    value: String,
    short: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_payload_uses_loss_color() {
        let event = NotifyEvent::FollowerCountChanged {
            username: "rustlang".to_string(),
            previous: 105,
            current: 98,
            delta: -7,
            timestamp: Utc::now(),
        };

        let payload = serde_json::to_value(SlackChannel::format_payload(&event)).unwrap();
        let attachment = &payload["attachments"][0];

        assert_eq!(attachment["color"], "#e74c3c");
        assert_eq!(attachment["title"], "📉 Net Loss: -7");
        assert!(attachment["text"].as_str().unwrap().contains("98 followers"));
        assert_eq!(attachment["fields"][0]["title"], "Previous");
    }

    #[test]
    fn test_failure_payload() {
        let event = NotifyEvent::MonitorFailed {
            username: "rustlang".to_string(),
            stage: "sample".to_string(),
            error: "login wall".to_string(),
            timestamp: Utc::now(),
        };

        let payload = serde_json::to_value(SlackChannel::format_payload(&event)).unwrap();
        let attachment = &payload["attachments"][0];

        assert_eq!(attachment["color"], "#c0392b");
        assert_eq!(attachment["text"], "Run failed during sample: login wall");
    }
}
