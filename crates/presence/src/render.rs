//! Human-readable message bodies for every sink.

use std::collections::BTreeSet;

use {
    chrono::{DateTime, Utc},
    chrono_tz::Tz,
};

use crate::{
    ids::UserId,
    transition::{PresenceTransition, TransitionKind},
};

pub const UNKNOWN_CHANNEL: &str = "unknown channel";
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

#[derive(Debug, Clone)]
pub struct Renderer {
    timezone: Tz,
    time_format: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Seoul, DEFAULT_TIME_FORMAT)
    }
}

/// Email subject and HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

/// Push notification title and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushContent {
    pub title: String,
    pub body: String,
}

impl Renderer {
    pub fn new(timezone: Tz, time_format: impl Into<String>) -> Self {
        Self {
            timezone,
            time_format: time_format.into(),
        }
    }

    pub fn timestamp(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.timezone)
            .format(&self.time_format)
            .to_string()
    }

    pub fn direct_message(&self, kind: TransitionKind, t: &PresenceTransition) -> Option<String> {
        let user = &t.subject_username;
        let time = self.timestamp(t.occurred_at);
        let text = match kind {
            TransitionKind::Joined => {
                format!("🔊 **{user}** has joined **{}**!\nTime: {time}", after(t))
            },
            TransitionKind::Switched => format!(
                "🔄 **{user}** switched from **{}** to **{}**!\nTime: {time}",
                before(t),
                after(t)
            ),
            TransitionKind::Left => {
                format!("👋 **{user}** has left **{}**!\nTime: {time}", before(t))
            },
            TransitionKind::Irrelevant => return None,
        };
        Some(text)
    }

    pub fn push(&self, kind: TransitionKind, t: &PresenceTransition) -> Option<PushContent> {
        let user = &t.subject_username;
        let title = match kind {
            TransitionKind::Joined => format!("🔊 {user} joined {}", after(t)),
            TransitionKind::Switched => format!("🔄 {user} switched to {}", after(t)),
            TransitionKind::Left => format!("👋 {user} left {}", before(t)),
            TransitionKind::Irrelevant => return None,
        };
        let detail = match kind {
            TransitionKind::Switched => format!("{user}: {} → {}", before(t), after(t)),
            TransitionKind::Left => format!("{user} left {}", before(t)),
            _ => format!("{user} is in {}", after(t)),
        };
        Some(PushContent {
            title,
            body: format!("{detail}\nTime: {}", self.timestamp(t.occurred_at)),
        })
    }

    pub fn email(&self, kind: TransitionKind, t: &PresenceTransition) -> Option<EmailContent> {
        let subject = self.push(kind, t)?.title;
        let user = html_escape(&t.subject_username);
        let (heading, color, sentence) = match kind {
            TransitionKind::Joined => (
                "Voice Channel Join Alert",
                "#3498db",
                format!(
                    "<strong>{user}</strong> has joined the voice channel <strong>{}</strong>!",
                    html_escape(after(t))
                ),
            ),
            TransitionKind::Switched => (
                "Voice Channel Switch Alert",
                "#e67e22",
                format!(
                    "<strong>{user}</strong> switched from <strong>{}</strong> to <strong>{}</strong>!",
                    html_escape(before(t)),
                    html_escape(after(t))
                ),
            ),
            TransitionKind::Left => (
                "Voice Channel Leave Alert",
                "#e74c3c",
                format!(
                    "<strong>{user}</strong> has left the voice channel <strong>{}</strong>!",
                    html_escape(before(t))
                ),
            ),
            TransitionKind::Irrelevant => return None,
        };
        let html = format!(
            "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; \
             padding: 20px; border: 1px solid #e0e0e0; border-radius: 5px;\">\
             <h2 style=\"color: {color};\">{heading}</h2>\
             <p style=\"font-size: 16px;\">{sentence}</p>\
             <p style=\"color: #666;\">Time: {}</p></div>",
            html_escape(&self.timestamp(t.occurred_at))
        );
        Some(EmailContent { subject, html })
    }

    /// Auto-reply posted when someone joins the owner while away.
    pub fn away_reply(&self, visitor: &UserId, away_message: &str) -> String {
        format!("{} {away_message}", visitor.mention())
    }

    /// Composite greeting listing everyone who stopped by.
    pub fn welcome_back(&self, owner: &UserId, mentions: &BTreeSet<UserId>) -> String {
        let visitors = mentions
            .iter()
            .map(UserId::mention)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "👋 Welcome back {}! While you were away, these people stopped by: {visitors}",
            owner.mention()
        )
    }

    pub fn auto_disabled_notice(&self) -> String {
        "Welcome back! Away mode was turned off because you joined a voice channel.".to_string()
    }
}

fn before(t: &PresenceTransition) -> &str {
    t.before_channel_name.as_deref().unwrap_or(UNKNOWN_CHANNEL)
}

fn after(t: &PresenceTransition) -> &str {
    t.after_channel_name.as_deref().unwrap_or(UNKNOWN_CHANNEL)
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
