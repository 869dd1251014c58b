//! Discord event handler for serenity.

use std::sync::Arc;

use {
    serenity::{
        all::{
            ChannelId as DiscordChannelId, Context, EventHandler, GatewayIntents, Message, Ready,
            UserId as DiscordUserId, VoiceState,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
    voicewatch_presence::{PresenceTransition, UserId},
    voicewatch_relay::Relay,
};

use crate::{
    Result,
    error::parse_snowflake,
    presence::{VoiceChange, VoiceDirectory, build_transition},
};

/// Routes voice-state updates and owner commands into the [`Relay`].
pub struct VoiceHandler {
    relay: Arc<Relay>,
    owner: DiscordUserId,
}

impl VoiceHandler {
    pub fn new(relay: Arc<Relay>) -> Result<Self> {
        let owner = DiscordUserId::new(parse_snowflake("owner_id", relay.owner().as_str())?);
        Ok(Self { relay, owner })
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_VOICE_STATES
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn username(ctx: &Context, old: Option<&VoiceState>, new: &VoiceState) -> Option<String> {
        new.member
            .as_ref()
            .or_else(|| old.and_then(|vs| vs.member.as_ref()))
            .map(|m| m.user.name.clone())
            .or_else(|| ctx.cache.user(new.user_id).map(|u| u.name.clone()))
    }

    fn transition(
        &self,
        ctx: &Context,
        old: Option<&VoiceState>,
        new: &VoiceState,
        username: &str,
    ) -> PresenceTransition {
        let change = VoiceChange {
            user: new.user_id,
            before: old.and_then(|vs| vs.channel_id),
            after: new.channel_id,
        };
        let guild = new
            .guild_id
            .or_else(|| old.and_then(|vs| vs.guild_id))
            .and_then(|gid| ctx.cache.guild(gid));
        match guild {
            Some(guild) => build_transition(change, username, self.owner, &*guild),
            None => build_transition(change, username, self.owner, &NoGuild),
        }
    }
}

/// Used when the guild is not cached: no names, owner never present.
struct NoGuild;

impl VoiceDirectory for NoGuild {
    fn channel_name(&self, _: DiscordChannelId) -> Option<String> {
        None
    }

    fn voice_channel_of(&self, _: DiscordUserId) -> Option<DiscordChannelId> {
        None
    }
}

#[async_trait]
impl EventHandler for VoiceHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            monitored_channels = self.relay.monitored().len(),
            "discord bot ready"
        );
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(username) = Self::username(&ctx, old.as_ref(), &new) else {
            debug!(user_id = %new.user_id, "voice update without resolvable user, skipping");
            return;
        };
        let transition = self.transition(&ctx, old.as_ref(), &new, &username);
        let report = self.relay.handle_presence(&transition).await;
        if report.failed > 0 {
            warn!(
                user_id = %new.user_id,
                failed = report.failed,
                "some notifications could not be delivered"
            );
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Skip bot messages to prevent loops
        if msg.author.bot {
            return;
        }
        if !msg.content.starts_with(self.relay.command_prefix()) {
            return;
        }

        let author = UserId::from(msg.author.id.to_string());
        let Some(reply) = self.relay.handle_command(&author, &msg.content).await else {
            return;
        };
        if let Err(e) = msg.reply(&ctx.http, reply).await {
            warn!(error = %e, channel_id = %msg.channel_id, "failed to send command reply");
        }
    }
}
