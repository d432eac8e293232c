//! Messaging-bot delivery channel.
//!
//! Sends through the Telegram Bot API to the chat the user linked via the
//! out-of-band account linking flow. An unlinked account is a skippable
//! condition, not a failure.

use crate::alerts::AlertMessage;
use crate::error::DispatchError;
use crate::notify::ChannelSender;
use crate::storage::{ChannelIdentity, NotificationPreferences};
use async_trait::async_trait;
use teloxide::Bot;
use teloxide::prelude::Requester;
use teloxide::types::ChatId;

pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn channel_name(&self) -> &'static str {
        "telegram"
    }

    fn enabled(&self, prefs: &NotificationPreferences) -> bool {
        prefs.telegram_alert
    }

    async fn send(
        &self,
        identity: &ChannelIdentity,
        alert: &AlertMessage,
    ) -> Result<(), DispatchError> {
        let chat_id = identity
            .chat_id
            .ok_or(DispatchError::MissingIdentity("telegram"))?;

        self.bot
            .send_message(ChatId(chat_id), alert.body.clone())
            .await?;
        Ok(())
    }
}
