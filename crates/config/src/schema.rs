//! Config schema types.

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

pub const DEFAULT_AWAY_MESSAGE: &str = "I'm away right now. I'll be back soon!";
pub const DEFAULT_TIMEZONE: &str = "Asia/Seoul";
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %Z";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VoicewatchConfig {
    pub discord: DiscordConfig,
    pub away: AwayConfig,
    pub notify: NotifyConfig,
    pub email: Option<EmailConfig>,
    pub push: Option<PushConfig>,
    pub display: DisplayConfig,
    pub delivery: DeliveryConfig,
}

/// Discord bot account and what it watches.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token from the Discord developer portal.
    pub token: Secret<String>,
    /// The single user allowed to run owner commands and receive alerts.
    pub owner_id: String,
    /// Voice channel IDs to observe.
    pub monitored_channels: Vec<String>,
    /// Prefix for owner text commands.
    pub command_prefix: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &"[REDACTED]")
            .field("owner_id", &self.owner_id)
            .field("monitored_channels", &self.monitored_channels)
            .field("command_prefix", &self.command_prefix)
            .finish()
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            owner_id: String::new(),
            monitored_channels: Vec::new(),
            command_prefix: "!".into(),
        }
    }
}

impl DiscordConfig {
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }

    /// Monitored IDs with blanks (unset env placeholders) removed.
    pub fn monitored_ids(&self) -> Vec<String> {
        self.monitored_channels
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Away-mode defaults used when the owner enables it without arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AwayConfig {
    pub default_message: String,
    pub notify_channel_id: Option<String>,
}

impl Default for AwayConfig {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_AWAY_MESSAGE.into(),
            notify_channel_id: None,
        }
    }
}

/// Which owner alert sinks fire on join/switch/leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub direct_message: bool,
    pub push: bool,
    pub email: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            direct_message: true,
            push: true,
            email: false,
        }
    }
}

/// SMTP delivery.
#[derive(Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// Overrides the implicit-TLS default port.
    #[serde(default)]
    pub smtp_port: Option<u16>,
    pub username: String,
    pub password: Secret<String>,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    pub to: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}

fn default_from_name() -> String {
    "Discord Bot".into()
}

/// Push webhook delivery.
#[derive(Clone, Deserialize)]
pub struct PushConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<Secret<String>>,
    #[serde(default = "default_push_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for PushConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_push_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// IANA zone name used for alert timestamps.
    pub timezone: String,
    /// chrono `strftime` pattern.
    pub time_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.into(),
            time_format: DEFAULT_TIME_FORMAT.into(),
        }
    }
}

impl DisplayConfig {
    pub fn parsed_timezone(&self) -> Option<chrono_tz::Tz> {
        self.timezone.parse().ok()
    }
}

/// Bounded retries for sink delivery.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            retry_delay_ms: 500,
        }
    }
}
