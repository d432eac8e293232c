//! Multi-channel notification dispatch.
//!
//! The dispatcher fans a decided alert out to every channel the user has
//! enabled. Each channel is an external collaborator behind the narrow
//! [`ChannelSender`] contract; a missing linked identity or a failed
//! delivery on one channel never stops the others, and never aborts the
//! polling cycle.

pub mod email;
pub mod telegram;
pub mod webhook;

pub use email::EmailSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;

use crate::alerts::AlertMessage;
use crate::error::DispatchError;
use crate::storage::{ChannelIdentity, NotificationPreferences};
use async_trait::async_trait;
use tracing::{error, info, warn};

/// One notification delivery channel (mail, messaging bot, chat-ops
/// webhook).
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Channel type name, e.g. `"email"`.
    fn channel_name(&self) -> &'static str;

    /// Whether the user opted into this channel.
    fn enabled(&self, prefs: &NotificationPreferences) -> bool;

    /// Deliver the rendered alert to this user's identity on the channel.
    async fn send(&self, identity: &ChannelIdentity, alert: &AlertMessage)
    -> Result<(), DispatchError>;
}

/// Routes one alert to all enabled channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn ChannelSender>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn ChannelSender>>) -> Self {
        Self { channels }
    }

    /// Attempt delivery on every enabled channel; returns how many
    /// deliveries succeeded.
    pub async fn dispatch(
        &self,
        identity: &ChannelIdentity,
        prefs: &NotificationPreferences,
        alert: &AlertMessage,
    ) -> usize {
        let mut delivered = 0;
        for channel in &self.channels {
            if !channel.enabled(prefs) {
                continue;
            }
            match channel.send(identity, alert).await {
                Ok(()) => {
                    info!(
                        channel = channel.channel_name(),
                        domain = %alert.domain,
                        "alert delivered"
                    );
                    delivered += 1;
                }
                Err(DispatchError::MissingIdentity(which)) => {
                    warn!(
                        channel = channel.channel_name(),
                        domain = %alert.domain,
                        "no linked {which} identity, channel skipped"
                    );
                }
                Err(e) => {
                    error!(
                        channel = channel.channel_name(),
                        domain = %alert.domain,
                        error = %e,
                        "alert delivery failed"
                    );
                }
            }
        }
        delivered
    }
}
