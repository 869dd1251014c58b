//! Runtime glue between the platform adapter, the presence core, and the
//! notification sinks.

pub mod commands;
pub mod error;
pub mod relay;

pub use {
    commands::{OwnerCommand, parse_command},
    error::{Error, Result},
    relay::{CommandPlan, PresencePlan, Relay, RelaySettings},
};
