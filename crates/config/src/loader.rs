use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::{EmailConfig, VoicewatchConfig},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "voicewatch.toml",
    "voicewatch.yaml",
    "voicewatch.yml",
    "voicewatch.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<VoicewatchConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./voicewatch.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/voicewatch/voicewatch.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `VoicewatchConfig::default()` only when no file exists; a
/// file that cannot be read or parsed is an error.
pub fn discover_and_load() -> Result<VoicewatchConfig> {
    load_from(find_config_file())
}

/// Load `path` (or defaults when `None`) and apply environment fallbacks.
pub fn load_from(path: Option<PathBuf>) -> Result<VoicewatchConfig> {
    let mut config = match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path)?
        },
        None => {
            debug!("no config file found, using defaults");
            VoicewatchConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/voicewatch/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "voicewatch").map(|d| d.config_dir().to_path_buf())
}

/// Fill settings the config left empty from the process environment.
pub fn apply_env_overrides(config: &mut VoicewatchConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(
    config: &mut VoicewatchConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if !config.discord.has_token()
        && let Some(token) = get("DISCORD_TOKEN")
    {
        config.discord.token = Secret::new(token);
    }
    if config.discord.owner_id.trim().is_empty()
        && let Some(owner) = get("USER_ID_TO_DM")
    {
        config.discord.owner_id = owner;
    }
    if config.discord.monitored_ids().is_empty() {
        config.discord.monitored_channels = ["TARGET_VOICE_CHANNEL1_ID", "TARGET_VOICE_CHANNEL2_ID"]
            .into_iter()
            .filter_map(&get)
            .collect();
    }
    if config.away.notify_channel_id.is_none() {
        config.away.notify_channel_id = get("AWAY_NOTIFY_CHANNEL_ID");
    }
    if config.email.is_none()
        && let (Some(username), Some(password), Some(to)) = (
            get("EMAIL_USER"),
            get("EMAIL_APP_PASS"),
            get("EMAIL_TO"),
        )
    {
        config.email = Some(EmailConfig {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: None,
            username,
            password: Secret::new(password),
            from_name: "Discord Bot".into(),
            to,
        });
        config.notify.email = true;
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<VoicewatchConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, "TOML", e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, "YAML", e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, "JSON", e)),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}
