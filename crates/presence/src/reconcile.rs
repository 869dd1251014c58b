use std::collections::BTreeSet;

use crate::{ids::UserId, session::AwaySession, transition::PresenceTransition};

/// What ended the away period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileTrigger {
    /// The owner turned away mode off by command.
    ManualOff,
    /// The owner joined a voice channel while away mode was on.
    OwnerReturned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Users who stopped by while the owner was away.
    pub welcome_mentions: BTreeSet<UserId>,
    /// Caller must switch away mode off (and tell the owner it did).
    pub should_disable_away: bool,
}

/// The owner was in no voice channel and has now joined one while away.
pub fn owner_returned(
    session: &AwaySession,
    transition: &PresenceTransition,
    owner: &UserId,
) -> bool {
    session.is_active()
        && transition.subject_user_id == *owner
        && transition.before_channel_id.is_none()
        && transition.after_channel_id.is_some()
}

/// Drain the roster. Always clears it, even when empty; whether an empty
/// mention set is worth announcing is the caller's call.
pub fn reconcile(session: &mut AwaySession, trigger: ReconcileTrigger) -> ReconciliationResult {
    let welcome_mentions = session.drain_roster();
    tracing::debug!(
        ?trigger,
        mentions = welcome_mentions.len(),
        "reconciled away roster"
    );
    ReconciliationResult {
        welcome_mentions,
        should_disable_away: trigger == ReconcileTrigger::OwnerReturned,
    }
}
