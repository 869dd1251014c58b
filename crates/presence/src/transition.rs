use {
    chrono::{DateTime, Utc},
    serde::Serialize,
};

use crate::{
    ids::{ChannelId, UserId},
    monitored::MonitoredChannels,
};

/// One voice-state change as reported by the platform.
#[derive(Debug, Clone)]
pub struct PresenceTransition {
    pub before_channel_id: Option<ChannelId>,
    pub after_channel_id: Option<ChannelId>,
    pub subject_user_id: UserId,
    pub subject_username: String,
    pub before_channel_name: Option<String>,
    pub after_channel_name: Option<String>,
    /// Whether the owner was in `after_channel_id` when the event arrived.
    pub owner_in_after_channel: bool,
    pub occurred_at: DateTime<Utc>,
}

impl PresenceTransition {
    /// A transition with no channel names resolved and the owner absent.
    pub fn new(
        subject_user_id: impl Into<UserId>,
        subject_username: impl Into<String>,
        before_channel_id: Option<ChannelId>,
        after_channel_id: Option<ChannelId>,
    ) -> Self {
        Self {
            before_channel_id,
            after_channel_id,
            subject_user_id: subject_user_id.into(),
            subject_username: subject_username.into(),
            before_channel_name: None,
            after_channel_name: None,
            owner_in_after_channel: false,
            occurred_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_channel_names(mut self, before: Option<String>, after: Option<String>) -> Self {
        self.before_channel_name = before;
        self.after_channel_name = after;
        self
    }

    #[must_use]
    pub fn with_owner_present(mut self, present: bool) -> Self {
        self.owner_in_after_channel = present;
        self
    }

    #[must_use]
    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn kind(&self, monitored: &MonitoredChannels) -> TransitionKind {
        classify(
            self.before_channel_id.as_ref(),
            self.after_channel_id.as_ref(),
            monitored,
        )
    }
}

/// Classified shape of a presence change relative to the monitored set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Entered a monitored channel from outside the set.
    Joined,
    /// Moved between two different monitored channels.
    Switched,
    /// Left the monitored set entirely.
    Left,
    /// Anything else: mute/deafen toggles, unmonitored channels.
    Irrelevant,
}

impl TransitionKind {
    /// Kinds that bring a user into a monitored channel.
    pub fn is_arrival(self) -> bool {
        matches!(self, Self::Joined | Self::Switched)
    }
}

/// Classify a before/after channel pair. Total over all inputs; the
/// first matching rule wins.
pub fn classify(
    before: Option<&ChannelId>,
    after: Option<&ChannelId>,
    monitored: &MonitoredChannels,
) -> TransitionKind {
    let was_in = monitored.contains(before);
    let is_in = monitored.contains(after);

    if is_in && !was_in {
        TransitionKind::Joined
    } else if is_in && was_in && before != after {
        TransitionKind::Switched
    } else if was_in && !is_in {
        TransitionKind::Left
    } else {
        TransitionKind::Irrelevant
    }
}
