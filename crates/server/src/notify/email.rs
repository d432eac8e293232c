//! SMTP delivery channel.

use crate::alerts::AlertMessage;
use crate::error::DispatchError;
use crate::notify::ChannelSender;
use crate::storage::{ChannelIdentity, NotificationPreferences};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

pub struct EmailSender {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl EmailSender {
    pub fn new(mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>, from: String) -> Self {
        Self { mailer, from }
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel_name(&self) -> &'static str {
        "email"
    }

    fn enabled(&self, prefs: &NotificationPreferences) -> bool {
        prefs.email_alert
    }

    async fn send(
        &self,
        identity: &ChannelIdentity,
        alert: &AlertMessage,
    ) -> Result<(), DispatchError> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(identity.email.parse()?)
            .subject(&alert.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body.clone())?;

        self.mailer.send(message).await?;
        Ok(())
    }
}
