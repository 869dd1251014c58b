use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::all::{ChannelId as DiscordChannelId, Http, UserId as DiscordUserId},
    tracing::debug,
    voicewatch_channels::{ChannelPostSink, DeliveryError, DirectMessageSink, Result},
    voicewatch_presence::{ChannelId, UserId},
};

use crate::error::parse_snowflake;

/// Discord's hard limit for message content.
pub const DISCORD_MAX_MESSAGE_LEN: usize = 2000;

/// Sends DMs and channel posts through the Discord REST API.
pub struct DiscordOutbound {
    http: Arc<Http>,
}

impl DiscordOutbound {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl DirectMessageSink for DiscordOutbound {
    async fn send_direct(&self, user: &UserId, text: &str) -> Result<()> {
        let id = parse_snowflake("user", user.as_str()).map_err(DeliveryError::invalid_input)?;
        let dm = DiscordUserId::new(id)
            .create_dm_channel(&self.http)
            .await
            .map_err(|e| DeliveryError::external("open discord DM", e))?;
        dm.id
            .say(&self.http, truncate(text))
            .await
            .map_err(|e| DeliveryError::external("send discord DM", e))?;
        debug!(user = %user, "discord DM sent");
        Ok(())
    }
}

#[async_trait]
impl ChannelPostSink for DiscordOutbound {
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<()> {
        let id =
            parse_snowflake("channel", channel.as_str()).map_err(DeliveryError::invalid_input)?;
        DiscordChannelId::new(id)
            .say(&self.http, truncate(text))
            .await
            .map_err(|e| DeliveryError::external("post to discord channel", e))?;
        debug!(channel = %channel, "discord channel post sent");
        Ok(())
    }
}

/// Cut at a char boundary so long rosters never get a message rejected.
fn truncate(text: &str) -> String {
    if text.chars().count() <= DISCORD_MAX_MESSAGE_LEN {
        return text.to_string();
    }
    let mut out: String = text.chars().take(DISCORD_MAX_MESSAGE_LEN - 1).collect();
    out.push('…');
    out
}
