//! Maps Discord voice-state updates onto [`PresenceTransition`]s.

use {
    serenity::all::{ChannelId as DiscordChannelId, Guild, UserId as DiscordUserId},
    voicewatch_presence::{ChannelId, PresenceTransition},
};

/// Read access to the guild state a transition needs.
pub trait VoiceDirectory {
    fn channel_name(&self, channel: DiscordChannelId) -> Option<String>;
    fn voice_channel_of(&self, user: DiscordUserId) -> Option<DiscordChannelId>;
}

impl VoiceDirectory for Guild {
    fn channel_name(&self, channel: DiscordChannelId) -> Option<String> {
        self.channels.get(&channel).map(|c| c.name.clone())
    }

    fn voice_channel_of(&self, user: DiscordUserId) -> Option<DiscordChannelId> {
        self.voice_states.get(&user).and_then(|vs| vs.channel_id)
    }
}

/// One voice-state change, stripped down to ids.
#[derive(Debug, Clone, Copy)]
pub struct VoiceChange {
    pub user: DiscordUserId,
    pub before: Option<DiscordChannelId>,
    pub after: Option<DiscordChannelId>,
}

/// Build the transition for `change`, resolving names and owner presence
/// through `directory`.
pub fn build_transition(
    change: VoiceChange,
    username: &str,
    owner: DiscordUserId,
    directory: &impl VoiceDirectory,
) -> PresenceTransition {
    let before_name = change.before.and_then(|c| directory.channel_name(c));
    let after_name = change.after.and_then(|c| directory.channel_name(c));
    let owner_present = change.after.is_some_and(|after| {
        change.user == owner || directory.voice_channel_of(owner) == Some(after)
    });

    PresenceTransition::new(
        change.user.to_string(),
        username,
        change.before.map(to_channel_id),
        change.after.map(to_channel_id),
    )
    .with_channel_names(before_name, after_name)
    .with_owner_present(owner_present)
}

fn to_channel_id(channel: DiscordChannelId) -> ChannelId {
    ChannelId::from(channel.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashMap;

    use {super::*, voicewatch_presence::UserId};

    #[derive(Default)]
    struct FakeGuild {
        names: HashMap<DiscordChannelId, String>,
        voice: HashMap<DiscordUserId, DiscordChannelId>,
    }

    impl VoiceDirectory for FakeGuild {
        fn channel_name(&self, channel: DiscordChannelId) -> Option<String> {
            self.names.get(&channel).cloned()
        }

        fn voice_channel_of(&self, user: DiscordUserId) -> Option<DiscordChannelId> {
            self.voice.get(&user).copied()
        }
    }

    const OWNER: DiscordUserId = DiscordUserId::new(1);
    const VISITOR: DiscordUserId = DiscordUserId::new(2);
    const LOUNGE: DiscordChannelId = DiscordChannelId::new(100);
    const STUDIO: DiscordChannelId = DiscordChannelId::new(200);

    fn guild() -> FakeGuild {
        let mut g = FakeGuild::default();
        g.names.insert(LOUNGE, "Lounge".into());
        g.names.insert(STUDIO, "Studio".into());
        g
    }

    #[test]
    fn join_resolves_names_and_ids() {
        let change = VoiceChange {
            user: VISITOR,
            before: None,
            after: Some(LOUNGE),
        };
        let t = build_transition(change, "visitor", OWNER, &guild());

        assert_eq!(t.subject_user_id, UserId::from("2"));
        assert_eq!(t.subject_username, "visitor");
        assert_eq!(t.before_channel_id, None);
        assert_eq!(t.after_channel_id, Some(ChannelId::from("100")));
        assert_eq!(t.after_channel_name.as_deref(), Some("Lounge"));
        assert!(!t.owner_in_after_channel);
    }

    #[test]
    fn owner_present_only_in_same_channel() {
        let mut g = guild();
        g.voice.insert(OWNER, STUDIO);

        let same = VoiceChange {
            user: VISITOR,
            before: Some(LOUNGE),
            after: Some(STUDIO),
        };
        assert!(build_transition(same, "v", OWNER, &g).owner_in_after_channel);

        let other = VoiceChange {
            user: VISITOR,
            before: None,
            after: Some(LOUNGE),
        };
        assert!(!build_transition(other, "v", OWNER, &g).owner_in_after_channel);
    }

    #[test]
    fn leave_has_no_owner_presence() {
        let mut g = guild();
        g.voice.insert(OWNER, LOUNGE);
        let change = VoiceChange {
            user: VISITOR,
            before: Some(LOUNGE),
            after: None,
        };
        let t = build_transition(change, "v", OWNER, &g);
        assert!(!t.owner_in_after_channel);
        assert_eq!(t.before_channel_name.as_deref(), Some("Lounge"));
        assert_eq!(t.after_channel_name, None);
    }

    #[test]
    fn unknown_channel_leaves_name_empty() {
        let change = VoiceChange {
            user: VISITOR,
            before: None,
            after: Some(DiscordChannelId::new(999)),
        };
        let t = build_transition(change, "v", OWNER, &guild());
        assert_eq!(t.after_channel_name, None);
    }
}
