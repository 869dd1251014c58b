use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    fanout::SinkInvocation,
    ids::{ChannelId, UserId},
};

/// Away-mode state for the owner. Lives for the process lifetime.
///
/// The roster only grows while away mode is active and is emptied by
/// [`crate::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct AwaySession {
    active: bool,
    message: String,
    notify_channel_id: Option<ChannelId>,
    roster: BTreeSet<UserId>,
}

/// Serializable snapshot of an [`AwaySession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwayStatus {
    pub active: bool,
    pub message: String,
    pub notify_channel_id: Option<ChannelId>,
    pub roster_size: usize,
}

impl AwaySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&mut self, message: impl Into<String>, notify_channel_id: Option<ChannelId>) {
        self.active = true;
        self.message = message.into();
        self.notify_channel_id = notify_channel_id;
    }

    /// Turn away mode off. The roster is left for the reconciler to drain.
    pub fn disable(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn notify_channel(&self) -> Option<&ChannelId> {
        self.notify_channel_id.as_ref()
    }

    pub fn roster(&self) -> &BTreeSet<UserId> {
        &self.roster
    }

    /// Returns `false` if the user was already on the roster.
    pub fn insert_roster(&mut self, user: UserId) -> bool {
        self.roster.insert(user)
    }

    pub fn drain_roster(&mut self) -> BTreeSet<UserId> {
        std::mem::take(&mut self.roster)
    }

    /// Commit the state-changing part of a dispatch decision.
    pub fn apply(&mut self, invocations: &[SinkInvocation]) {
        for invocation in invocations {
            if let SinkInvocation::RosterInsert { user } = invocation {
                self.insert_roster(user.clone());
            }
        }
    }

    pub fn status(&self) -> AwayStatus {
        AwayStatus {
            active: self.active,
            message: self.message.clone(),
            notify_channel_id: self.notify_channel_id.clone(),
            roster_size: self.roster.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_inactive_and_empty() {
        let session = AwaySession::new();
        assert!(!session.is_active());
        assert!(session.roster().is_empty());
        assert_eq!(session.notify_channel(), None);
    }

    #[test]
    fn enable_then_disable_keeps_roster() {
        let mut session = AwaySession::new();
        session.enable("brb", Some(ChannelId::from("c")));
        assert!(session.insert_roster(UserId::from("u")));
        session.disable();
        assert!(!session.is_active());
        assert_eq!(session.roster().len(), 1);
        assert_eq!(session.message(), "brb");
    }

    #[test]
    fn roster_insert_is_idempotent() {
        let mut session = AwaySession::new();
        assert!(session.insert_roster(UserId::from("u")));
        assert!(!session.insert_roster(UserId::from("u")));
        assert_eq!(session.roster().len(), 1);
    }

    #[test]
    fn apply_only_commits_roster_inserts() {
        let mut session = AwaySession::new();
        session.apply(&[
            SinkInvocation::RosterInsert {
                user: UserId::from("v"),
            },
            SinkInvocation::Push {
                title: "t".into(),
                body: "b".into(),
            },
        ]);
        assert_eq!(session.status().roster_size, 1);
        assert!(!session.is_active());
    }
}
