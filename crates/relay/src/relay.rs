use std::sync::{Mutex, MutexGuard};

use {
    tracing::{debug, info, warn},
    voicewatch_channels::{Deliverer, DeliveryReport, authorize},
    voicewatch_config::VoicewatchConfig,
    voicewatch_presence::{
        AwaySession, AwayStatus, ChannelId, Fanout, MonitoredChannels, PresenceTransition,
        ReconcileTrigger, Renderer, SinkInvocation, SinkSet, TransitionKind, UserId,
        owner_returned, reconcile,
    },
};

use crate::{
    Error, Result,
    commands::{OwnerCommand, help_text, parse_command},
};

const REJECTION: &str = "⛔ Only the owner can use this command.";

/// Everything the relay needs besides its sinks.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub owner: UserId,
    pub monitored: MonitoredChannels,
    pub sinks: SinkSet,
    pub renderer: Renderer,
    pub default_away_message: String,
    pub default_notify_channel: Option<ChannelId>,
    pub command_prefix: String,
}

impl RelaySettings {
    pub fn from_config(config: &VoicewatchConfig) -> Result<Self> {
        let owner = config.discord.owner_id.trim();
        if owner.is_empty() {
            return Err(Error::MissingOwner);
        }
        let timezone = config
            .display
            .parsed_timezone()
            .ok_or_else(|| Error::UnknownTimezone(config.display.timezone.clone()))?;

        Ok(Self {
            owner: UserId::from(owner),
            monitored: MonitoredChannels::new(config.discord.monitored_ids()),
            sinks: SinkSet {
                direct_message: config.notify.direct_message,
                push: config.notify.push,
                email: config.notify.email,
            },
            renderer: Renderer::new(timezone, config.display.time_format.clone()),
            default_away_message: config.away.default_message.clone(),
            default_notify_channel: config
                .away
                .notify_channel_id
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(ChannelId::from),
            command_prefix: config.discord.command_prefix.clone(),
        })
    }
}

/// Decision for one presence event, already committed to the session.
#[derive(Debug, Clone)]
pub struct PresencePlan {
    pub kind: TransitionKind,
    pub owner_returned: bool,
    pub invocations: Vec<SinkInvocation>,
}

/// Decision for one owner command, already committed to the session.
#[derive(Debug, Clone)]
pub struct CommandPlan {
    pub reply: String,
    pub invocations: Vec<SinkInvocation>,
}

/// Owns the away session and turns platform events into deliveries.
///
/// The session lock is only held while deciding; it is released before any
/// sink is awaited.
pub struct Relay {
    settings: RelaySettings,
    fanout: Fanout,
    session: Mutex<AwaySession>,
    deliverer: Deliverer,
}

impl Relay {
    pub fn new(settings: RelaySettings, deliverer: Deliverer) -> Self {
        let fanout = Fanout::new(
            settings.owner.clone(),
            settings.sinks,
            settings.renderer.clone(),
        );
        Self {
            settings,
            fanout,
            session: Mutex::new(AwaySession::new()),
            deliverer,
        }
    }

    pub fn owner(&self) -> &UserId {
        &self.settings.owner
    }

    pub fn monitored(&self) -> &MonitoredChannels {
        &self.settings.monitored
    }

    pub fn command_prefix(&self) -> &str {
        &self.settings.command_prefix
    }

    pub fn status(&self) -> AwayStatus {
        self.session().status()
    }

    fn session(&self) -> MutexGuard<'_, AwaySession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Classify, reconcile, and fan out one presence change.
    pub fn plan_presence(&self, transition: &PresenceTransition) -> PresencePlan {
        let owner = &self.settings.owner;
        let renderer = self.fanout.renderer();
        let mut session = self.session();
        let mut invocations = Vec::new();

        let returned = owner_returned(&session, transition, owner);
        if returned {
            let result = reconcile(&mut session, ReconcileTrigger::OwnerReturned);
            if result.should_disable_away {
                session.disable();
                invocations.push(SinkInvocation::DirectMessage {
                    user: owner.clone(),
                    text: renderer.auto_disabled_notice(),
                });
            }
            if !result.welcome_mentions.is_empty()
                && let Some(channel) = session.notify_channel()
            {
                invocations.push(SinkInvocation::ChannelPost {
                    channel: channel.clone(),
                    text: renderer.welcome_back(owner, &result.welcome_mentions),
                });
            }
            info!(
                visitors = result.welcome_mentions.len(),
                "owner returned, away mode turned off"
            );
        }

        let kind = transition.kind(&self.settings.monitored);
        let decided = self.fanout.dispatch(kind, transition, &session);
        session.apply(&decided);
        invocations.extend(decided);

        debug!(
            user = %transition.subject_user_id,
            ?kind,
            away = session.is_active(),
            roster = session.roster().len(),
            invocations = invocations.len(),
            "presence transition planned"
        );

        PresencePlan {
            kind,
            owner_returned: returned,
            invocations,
        }
    }

    pub async fn handle_presence(&self, transition: &PresenceTransition) -> DeliveryReport {
        let plan = self.plan_presence(transition);
        if plan.kind != TransitionKind::Irrelevant {
            info!(
                user = %transition.subject_username,
                kind = ?plan.kind,
                "voice presence change"
            );
        }
        self.deliverer.deliver_all(plan.invocations).await
    }

    /// `None` when the text is not a command at all.
    pub fn plan_command(&self, author: &UserId, text: &str) -> Option<CommandPlan> {
        let command = parse_command(&self.settings.command_prefix, text)?;

        if let Err(e) = authorize(author, &self.settings.owner) {
            warn!(error = %e, ?command, "rejected owner command");
            return Some(CommandPlan {
                reply: REJECTION.to_string(),
                invocations: Vec::new(),
            });
        }

        Some(self.execute(command))
    }

    pub async fn handle_command(&self, author: &UserId, text: &str) -> Option<String> {
        let plan = self.plan_command(author, text)?;
        if !plan.invocations.is_empty() {
            self.deliverer.deliver_all(plan.invocations).await;
        }
        Some(plan.reply)
    }

    fn execute(&self, command: OwnerCommand) -> CommandPlan {
        let mut session = self.session();
        match command {
            OwnerCommand::AwayOn { channel, message } => {
                let message = message.unwrap_or_else(|| self.settings.default_away_message.clone());
                let channel = channel.or_else(|| self.settings.default_notify_channel.clone());
                session.enable(message, channel);
                info!(notify_channel = ?session.notify_channel(), "away mode on");
                CommandPlan {
                    reply: format!("✅ Away mode enabled.\n{}", status_text(&session.status())),
                    invocations: Vec::new(),
                }
            },
            OwnerCommand::AwayOff => {
                let was_active = session.is_active();
                session.disable();
                let result = reconcile(&mut session, ReconcileTrigger::ManualOff);

                let mut invocations = Vec::new();
                if !result.welcome_mentions.is_empty()
                    && let Some(channel) = session.notify_channel()
                {
                    invocations.push(SinkInvocation::ChannelPost {
                        channel: channel.clone(),
                        text: self
                            .fanout
                            .renderer()
                            .welcome_back(&self.settings.owner, &result.welcome_mentions),
                    });
                }
                info!(
                    visitors = result.welcome_mentions.len(),
                    "away mode off"
                );

                let reply = if was_active {
                    format!(
                        "✅ Away mode disabled. {} visitor(s) while you were away.",
                        result.welcome_mentions.len()
                    )
                } else {
                    "Away mode is already off.".to_string()
                };
                CommandPlan { reply, invocations }
            },
            OwnerCommand::AwayStatus => CommandPlan {
                reply: status_text(&session.status()),
                invocations: Vec::new(),
            },
            OwnerCommand::Help => CommandPlan {
                reply: help_text(&self.settings.command_prefix),
                invocations: Vec::new(),
            },
        }
    }
}

fn status_text(status: &AwayStatus) -> String {
    let notify = status
        .notify_channel_id
        .as_ref()
        .map_or_else(|| "not set".to_string(), ChannelId::mention);
    format!(
        "Away mode: {}\nMessage: {}\nNotify channel: {notify}\nVisitors recorded: {}",
        if status.active { "on" } else { "off" },
        status.message,
        status.roster_size
    )
}
