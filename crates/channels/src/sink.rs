use {
    async_trait::async_trait,
    voicewatch_presence::{ChannelId, UserId},
};

use crate::Result;

/// Private message to a single user.
#[async_trait]
pub trait DirectMessageSink: Send + Sync {
    async fn send_direct(&self, user: &UserId, text: &str) -> Result<()>;
}

/// Post into a text channel.
#[async_trait]
pub trait ChannelPostSink: Send + Sync {
    async fn post(&self, channel: &ChannelId, text: &str) -> Result<()>;
}

/// Email to the configured recipient.
#[async_trait]
pub trait EmailSink: Send + Sync {
    async fn send_email(&self, subject: &str, html: &str) -> Result<()>;
}

/// Push notification through a webhook.
#[async_trait]
pub trait PushSink: Send + Sync {
    async fn send_push(&self, title: &str, body: &str) -> Result<()>;
}
