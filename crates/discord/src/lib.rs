//! Discord adapter for voicewatch.
//!
//! Receives voice-state and message events through serenity, maps them onto
//! the presence core, and delivers DMs and channel posts over the Discord
//! HTTP API.

pub mod client;
pub mod error;
pub mod handler;
pub mod outbound;
pub mod presence;

pub use {
    client::{connect, run},
    error::{Error, Result},
    handler::VoiceHandler,
    outbound::DiscordOutbound,
};
