//! Configuration loading, validation, and env substitution.
//!
//! Config files: `voicewatch.toml`, `voicewatch.yaml`, or `voicewatch.json`
//! Searched in `./` then `~/.config/voicewatch/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in all
//! string values. Settings the file leaves empty fall back to the plain
//! environment variables the bot has always read (`DISCORD_TOKEN`,
//! `USER_ID_TO_DM`, ...).

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        load_from,
    },
    schema::{
        AwayConfig, DeliveryConfig, DiscordConfig, DisplayConfig, EmailConfig, NotifyConfig,
        PushConfig, VoicewatchConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
