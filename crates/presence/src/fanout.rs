use serde::{Deserialize, Serialize};

use crate::{
    ids::{ChannelId, UserId},
    render::Renderer,
    session::AwaySession,
    transition::{PresenceTransition, TransitionKind},
};

/// Owner alert sinks that are switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSet {
    pub direct_message: bool,
    pub push: bool,
    pub email: bool,
}

impl Default for SinkSet {
    fn default() -> Self {
        Self {
            direct_message: true,
            push: true,
            email: false,
        }
    }
}

/// A single side effect decided by [`Fanout::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkInvocation {
    DirectMessage { user: UserId, text: String },
    Push { title: String, body: String },
    Email { subject: String, html: String },
    ChannelPost { channel: ChannelId, text: String },
    /// Not a delivery: committed to the session by [`AwaySession::apply`].
    RosterInsert { user: UserId },
}

impl SinkInvocation {
    /// Short label for logs.
    pub fn sink_name(&self) -> &'static str {
        match self {
            Self::DirectMessage { .. } => "direct_message",
            Self::Push { .. } => "push",
            Self::Email { .. } => "email",
            Self::ChannelPost { .. } => "channel_post",
            Self::RosterInsert { .. } => "roster",
        }
    }

    pub fn is_delivery(&self) -> bool {
        !matches!(self, Self::RosterInsert { .. })
    }
}

/// Decides which sinks hear about a classified transition.
#[derive(Debug, Clone)]
pub struct Fanout {
    owner: UserId,
    sinks: SinkSet,
    renderer: Renderer,
}

impl Fanout {
    pub fn new(owner: UserId, sinks: SinkSet, renderer: Renderer) -> Self {
        Self {
            owner,
            sinks,
            renderer,
        }
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Pure decision: reads the session, never mutates it.
    pub fn dispatch(
        &self,
        kind: TransitionKind,
        transition: &PresenceTransition,
        session: &AwaySession,
    ) -> Vec<SinkInvocation> {
        if kind == TransitionKind::Irrelevant {
            return Vec::new();
        }

        let mut out = self.owner_alerts(kind, transition);

        if kind.is_arrival()
            && session.is_active()
            && transition.owner_in_after_channel
            && transition.subject_user_id != self.owner
        {
            out.push(SinkInvocation::RosterInsert {
                user: transition.subject_user_id.clone(),
            });
            if let Some(channel) = session.notify_channel() {
                out.push(SinkInvocation::ChannelPost {
                    channel: channel.clone(),
                    text: self
                        .renderer
                        .away_reply(&transition.subject_user_id, session.message()),
                });
            }
        }

        out
    }

    fn owner_alerts(&self, kind: TransitionKind, t: &PresenceTransition) -> Vec<SinkInvocation> {
        let mut out = Vec::with_capacity(3);
        if self.sinks.direct_message
            && let Some(text) = self.renderer.direct_message(kind, t)
        {
            out.push(SinkInvocation::DirectMessage {
                user: self.owner.clone(),
                text,
            });
        }
        if self.sinks.push
            && let Some(push) = self.renderer.push(kind, t)
        {
            out.push(SinkInvocation::Push {
                title: push.title,
                body: push.body,
            });
        }
        if self.sinks.email
            && let Some(email) = self.renderer.email(kind, t)
        {
            out.push(SinkInvocation::Email {
                subject: email.subject,
                html: email.html,
            });
        }
        out
    }
}
