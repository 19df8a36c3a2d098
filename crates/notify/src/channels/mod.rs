//! Notification channel implementations.

pub mod discord;
pub mod slack;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::ChannelError;
use crate::events::NotifyEvent;

/// Timeout applied to every webhook request.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for notification channels (Discord, Slack, etc.).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Send a notification event to this channel.
    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError>;
}

/// Build the HTTP client shared by the webhook channels.
pub(crate) fn webhook_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Turn a webhook response into a channel result.
pub(crate) async fn check_response(
    channel: &'static str,
    response: reqwest::Response,
) -> Result<(), ChannelError> {
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);
        tracing::warn!(channel, retry_after_secs, "Rate limited by webhook");
        return Err(ChannelError::RateLimited { retry_after_secs });
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        channel,
        status = %status,
        body = %body,
        "Webhook request failed"
    );

    Err(ChannelError::Rejected {
        channel,
        status: status.as_u16(),
        body,
    })
}
