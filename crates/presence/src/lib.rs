//! Voice-presence core: classify channel membership changes, track away
//! mode, and decide which notifications each change produces.
//!
//! Nothing in this crate performs I/O. [`Fanout::dispatch`] returns
//! [`SinkInvocation`] descriptions that the caller commits to the
//! [`AwaySession`] and then hands to the delivery layer.

pub mod fanout;
pub mod ids;
pub mod monitored;
pub mod reconcile;
pub mod render;
pub mod session;
pub mod transition;

pub use {
    fanout::{Fanout, SinkInvocation, SinkSet},
    ids::{ChannelId, UserId},
    monitored::MonitoredChannels,
    reconcile::{ReconcileTrigger, ReconciliationResult, owner_returned, reconcile},
    render::Renderer,
    session::{AwaySession, AwayStatus},
    transition::{PresenceTransition, TransitionKind, classify},
};
