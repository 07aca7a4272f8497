//! Slack incoming-webhook notifier.
//!
//! Posts `{"text": "<message>"}` to a pre-configured webhook URL. Anything
//! other than HTTP 200 is a delivery failure carrying the status and the
//! response body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use apptrail_core::WorkloadUpdate;

use crate::error::NotifyError;
use crate::notifier::Notifier;

/// Timeout applied to webhook requests unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SlackMessage {
    text: String,
}

pub struct SlackNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, NotifyError> {
        Self::with_timeout(webhook_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        webhook_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apptrail/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(webhook_url, client))
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(webhook_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client,
        }
    }
}

/// Render an update as the Slack message text.
pub fn format_message(update: &WorkloadUpdate) -> String {
    format!(
        "Workload version released:\n```Kind: {}\nName: {}\nNamespace: {}\nPrevious Version: {}\nCurrent Version: {}\n```",
        update.kind, update.name, update.namespace, update.previous_version, update.current_version,
    )
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn notify(&self, update: &WorkloadUpdate) -> Result<(), NotifyError> {
        let message = SlackMessage {
            text: format_message(update),
        };

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            namespace = %update.namespace,
            name = %update.name,
            "slack message sent"
        );
        Ok(())
    }
}
