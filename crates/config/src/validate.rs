//! Configuration validation engine.
//!
//! Validates configuration files against the known schema, detects
//! unknown/misspelled fields, and checks that the settings the relay needs
//! to start are present and well-formed.

use std::{collections::HashMap, path::Path};

use {
    chrono::format::{Item, StrftimeItems},
    secrecy::ExposeSecret,
};

use crate::{
    env_subst::substitute_env,
    loader::{apply_env_overrides, find_config_file, load_config},
    schema::VoicewatchConfig,
};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "missing-value",
    /// "unresolved-env", "invalid-value", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "discord.owner_id"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}] {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

/// Represents the expected shape of the configuration schema.
enum KnownKeys {
    /// A struct with fixed field names.
    Struct(HashMap<&'static str, KnownKeys>),
    /// An array of typed items.
    Array(Box<KnownKeys>),
    /// Scalar value, stop recursion.
    Leaf,
}

/// Build the full schema map mirroring every field in `schema.rs`.
fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Array, Leaf, Struct};

    Struct(HashMap::from([
        (
            "discord",
            Struct(HashMap::from([
                ("token", Leaf),
                ("owner_id", Leaf),
                ("monitored_channels", Array(Box::new(Leaf))),
                ("command_prefix", Leaf),
            ])),
        ),
        (
            "away",
            Struct(HashMap::from([
                ("default_message", Leaf),
                ("notify_channel_id", Leaf),
            ])),
        ),
        (
            "notify",
            Struct(HashMap::from([
                ("direct_message", Leaf),
                ("push", Leaf),
                ("email", Leaf),
            ])),
        ),
        (
            "email",
            Struct(HashMap::from([
                ("smtp_host", Leaf),
                ("smtp_port", Leaf),
                ("username", Leaf),
                ("password", Leaf),
                ("from_name", Leaf),
                ("to", Leaf),
            ])),
        ),
        (
            "push",
            Struct(HashMap::from([
                ("url", Leaf),
                ("token", Leaf),
                ("timeout_secs", Leaf),
            ])),
        ),
        (
            "display",
            Struct(HashMap::from([("timezone", Leaf), ("time_format", Leaf)])),
        ),
        (
            "delivery",
            Struct(HashMap::from([
                ("max_retries", Leaf),
                ("retry_delay_ms", Leaf),
            ])),
        ),
    ]))
}

// ── Levenshtein distance ────────────────────────────────────────────────────

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Find the best match for `needle` among `candidates` using Levenshtein
/// distance. Returns `Some(best)` if the distance is <= `max_distance`.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
///
/// Environment fallbacks are applied before the semantic checks, so a
/// missing file is fine as long as the environment carries the settings.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

    let Some(actual_path) = config_path else {
        let mut config = VoicewatchConfig::default();
        apply_env_overrides(&mut config);
        let mut diagnostics = vec![Diagnostic::new(
            Severity::Info,
            "file-ref",
            "",
            "no config file found; using defaults and environment",
        )];
        diagnostics.extend(check_config(&config));
        return ValidationResult {
            diagnostics,
            config_path: None,
        };
    };

    let content = match std::fs::read_to_string(&actual_path) {
        Ok(content) => content,
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    format!("failed to read config file: {e}"),
                )],
                config_path: Some(actual_path),
            };
        },
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = if is_toml {
        validate_toml_str(&substitute_env(&content))
    } else {
        match load_config(&actual_path) {
            Ok(mut config) => {
                apply_env_overrides(&mut config);
                ValidationResult {
                    diagnostics: check_config(&config),
                    config_path: None,
                }
            },
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic::new(
                    Severity::Error,
                    "syntax",
                    "",
                    e.to_string(),
                )],
                config_path: None,
            },
        }
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate a TOML string (already env-substituted) without touching the
/// file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax
    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                format!("TOML syntax error: {e}"),
            ));
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    // 2. Unknown fields
    let schema = build_schema_map();
    check_unknown_fields(&toml_value, &schema, "", &mut diagnostics);

    // 3. Types, then semantics on whatever parsed
    match toml::from_str::<VoicewatchConfig>(toml_str) {
        Ok(mut config) => {
            apply_env_overrides(&mut config);
            diagnostics.extend(check_config(&config));
        },
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Walk the TOML value tree against the schema tree and flag unknown keys.
fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match (value, schema) {
        (toml::Value::Table(table), KnownKeys::Struct(fields)) => {
            let known_keys: Vec<&str> = fields.keys().copied().collect();
            for (key, child_value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(child_schema) = fields.get(key.as_str()) {
                    check_unknown_fields(child_value, child_schema, &path, diagnostics);
                } else {
                    let msg = match suggest(key, &known_keys, 3) {
                        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
                        None => "unknown field".to_string(),
                    };
                    diagnostics.push(Diagnostic::new(
                        Severity::Warning,
                        "unknown-field",
                        path,
                        msg,
                    ));
                }
            }
        },
        (toml::Value::Array(arr), KnownKeys::Array(item_schema)) => {
            for (i, item) in arr.iter().enumerate() {
                let path = format!("{prefix}[{i}]");
                check_unknown_fields(item, item_schema, &path, diagnostics);
            }
        },
        // Leaf or type mismatch: stop recursion (type errors caught later)
        _ => {},
    }
}

fn is_snowflake(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_digit())
}

fn is_unresolved(value: &str) -> bool {
    value.contains("${")
}

/// Semantic checks on a parsed config. Errors here stop the relay from
/// starting.
#[must_use]
pub fn check_config(config: &VoicewatchConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    check_discord(config, &mut diagnostics);
    check_sinks(config, &mut diagnostics);
    check_display(config, &mut diagnostics);

    if config.away.notify_channel_id.is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Info,
            "missing-value",
            "away.notify_channel_id",
            "no default notify channel; visitors are still recorded while away",
        ));
    }
    if config.delivery.max_retries > 5 {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "invalid-value",
            "delivery.max_retries",
            "more than 5 retries delays every alert behind a failing sink",
        ));
    }
    diagnostics
}

fn check_discord(config: &VoicewatchConfig, diagnostics: &mut Vec<Diagnostic>) {
    let discord = &config.discord;

    let token = discord.token.expose_secret();
    if token.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "missing-value",
            "discord.token",
            "bot token is required (set it here or via DISCORD_TOKEN)",
        ));
    } else if is_unresolved(token) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "unresolved-env",
            "discord.token",
            "token references an environment variable that is not set",
        ));
    }

    if discord.owner_id.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "missing-value",
            "discord.owner_id",
            "owner user ID is required (set it here or via USER_ID_TO_DM)",
        ));
    } else if !is_snowflake(&discord.owner_id) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "invalid-value",
            "discord.owner_id",
            format!("\"{}\" is not a numeric Discord ID", discord.owner_id),
        ));
    }

    let monitored = discord.monitored_ids();
    if monitored.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "missing-value",
            "discord.monitored_channels",
            "at least one voice channel must be monitored",
        ));
    }
    for (i, id) in monitored.iter().enumerate() {
        if !is_snowflake(id) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "invalid-value",
                format!("discord.monitored_channels[{i}]"),
                format!("\"{id}\" is not a numeric Discord ID and will never match"),
            ));
        }
    }

    if discord.command_prefix.trim().is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "invalid-value",
            "discord.command_prefix",
            "command prefix cannot be empty",
        ));
    }

    if let Some(channel) = &config.away.notify_channel_id
        && !is_snowflake(channel)
    {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "invalid-value",
            "away.notify_channel_id",
            format!("\"{channel}\" is not a numeric Discord ID"),
        ));
    }
}

fn check_sinks(config: &VoicewatchConfig, diagnostics: &mut Vec<Diagnostic>) {
    let notify = config.notify;
    if !notify.direct_message && !notify.push && !notify.email {
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "invalid-value",
            "notify",
            "every owner alert sink is disabled",
        ));
    }

    match &config.email {
        Some(email) => {
            if !email.to.contains('@') {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "invalid-value",
                    "email.to",
                    format!("\"{}\" is not an email address", email.to),
                ));
            }
            if email.password.expose_secret().is_empty()
                || is_unresolved(email.password.expose_secret())
            {
                diagnostics.push(Diagnostic::new(
                    Severity::Error,
                    "missing-value",
                    "email.password",
                    "SMTP password is empty or references an unset variable",
                ));
            }
        },
        None if notify.email => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "missing-value",
            "email",
            "notify.email is on but there is no [email] section",
        )),
        None => {},
    }

    match &config.push {
        Some(push) => match url::Url::parse(&push.url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {},
            Ok(url) => diagnostics.push(Diagnostic::new(
                Severity::Error,
                "invalid-value",
                "push.url",
                format!("unsupported URL scheme \"{}\"", url.scheme()),
            )),
            Err(e) => diagnostics.push(Diagnostic::new(
                Severity::Error,
                "invalid-value",
                "push.url",
                format!("invalid URL: {e}"),
            )),
        },
        None if notify.push => diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "missing-value",
            "push",
            "notify.push is on but there is no [push] section; push alerts are skipped",
        )),
        None => {},
    }
}

fn check_display(config: &VoicewatchConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.display.parsed_timezone().is_none() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "invalid-value",
            "display.timezone",
            format!("unknown timezone \"{}\"", config.display.timezone),
        ));
    }
    if StrftimeItems::new(&config.display.time_format).any(|item| matches!(item, Item::Error)) {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "invalid-value",
            "display.time_format",
            "invalid strftime pattern",
        ));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        [discord]
        token = "abc"
        owner_id = "100"
        monitored_channels = ["200", "201"]

        [away]
        notify_channel_id = "300"

        [push]
        url = "https://push.example/topic"
    "#;

    fn paths(result: &ValidationResult, severity: Severity) -> Vec<String> {
        result
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.path.clone())
            .collect()
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("owner_id", "ownr_id"), 1);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn valid_config_has_no_errors_or_warnings() {
        let result = validate_toml_str(VALID);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(result.count(Severity::Warning), 0, "{:?}", result.diagnostics);
    }

    #[test]
    fn unknown_key_with_suggestion() {
        let input = format!("{VALID}\n[dispaly]\ntimezone = \"UTC\"\n");
        let result = validate_toml_str(&input);
        let diag = result
            .diagnostics
            .iter()
            .find(|d| d.category == "unknown-field")
            .unwrap();
        assert_eq!(diag.path, "dispaly");
        assert!(diag.message.contains("did you mean \"display\""));
    }

    #[test]
    fn nested_unknown_key() {
        let input = VALID.replace("owner_id", "ownr_id");
        let result = validate_toml_str(&input);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.path == "discord.ownr_id" && d.message.contains("owner_id"))
        );
    }

    #[test]
    fn syntax_error_detected() {
        let result = validate_toml_str("[discord\n");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_detected() {
        let result = validate_toml_str("[discord]\nmonitored_channels = 5\n");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn missing_required_values() {
        let mut config = VoicewatchConfig::default();
        config.away.notify_channel_id = Some("1".into());
        let diags = check_config(&config);
        let errors: Vec<_> = diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.path.as_str())
            .collect();
        assert!(errors.contains(&"discord.token"));
        assert!(errors.contains(&"discord.owner_id"));
        assert!(errors.contains(&"discord.monitored_channels"));
    }

    #[test]
    fn unresolved_token_is_error() {
        let input = VALID.replace("\"abc\"", "\"${VOICEWATCH_UNSET_TOKEN_XYZ}\"");
        let result = validate_toml_str(&input);
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.category == "unresolved-env" && d.path == "discord.token")
        );
    }

    #[test]
    fn bad_timezone_and_push_url() {
        let input = format!(
            "{}\n[display]\ntimezone = \"Mars/Base\"\n",
            VALID.replace("https://push.example/topic", "ftp://push.example")
        );
        let result = validate_toml_str(&input);
        let errors = paths(&result, Severity::Error);
        assert!(errors.contains(&"display.timezone".to_string()));
        assert!(errors.contains(&"push.url".to_string()));
    }

    #[test]
    fn email_enabled_without_section() {
        let input = format!("{VALID}\n[notify]\nemail = true\n");
        let result = validate_toml_str(&input);
        assert!(paths(&result, Severity::Error).contains(&"email".to_string()));
    }

    #[test]
    fn push_enabled_without_section_is_only_a_warning() {
        let input = VALID.replace("[push]\n        url = \"https://push.example/topic\"\n", "");
        let result = validate_toml_str(&input);
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
        assert_eq!(paths(&result, Severity::Warning), vec!["push"]);

        let off = format!("{input}\n[notify]\npush = false\n");
        assert!(paths(&validate_toml_str(&off), Severity::Warning).is_empty());
    }

    #[test]
    fn non_numeric_channel_is_warning() {
        let input = VALID.replace("\"201\"", "\"general\"");
        let result = validate_toml_str(&input);
        assert!(!result.has_errors());
        assert_eq!(
            paths(&result, Severity::Warning),
            vec!["discord.monitored_channels[1]".to_string()]
        );
    }

    #[test]
    fn validate_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicewatch.toml");
        std::fs::write(&path, VALID).unwrap();
        let result = validate(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert!(!result.has_errors());
    }
}
