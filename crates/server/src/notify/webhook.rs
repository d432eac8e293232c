//! Chat-ops webhook delivery channel: a JSON POST to the user's configured
//! endpoint.

use crate::alerts::AlertMessage;
use crate::error::DispatchError;
use crate::notify::ChannelSender;
use crate::storage::{ChannelIdentity, NotificationPreferences};
use async_trait::async_trait;

pub struct WebhookSender {
    client: reqwest::Client,
}

impl WebhookSender {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChannelSender for WebhookSender {
    fn channel_name(&self) -> &'static str {
        "webhook"
    }

    fn enabled(&self, prefs: &NotificationPreferences) -> bool {
        prefs.webhook_alert
    }

    async fn send(
        &self,
        identity: &ChannelIdentity,
        alert: &AlertMessage,
    ) -> Result<(), DispatchError> {
        let url = identity
            .webhook_url
            .as_deref()
            .ok_or(DispatchError::MissingIdentity("webhook"))?;

        let payload = serde_json::json!({
            "domain": alert.domain,
            "alert": alert.kind.as_str(),
            "subject": alert.subject,
            "message": alert.body,
        });

        self.client
            .post(url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
