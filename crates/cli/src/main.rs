mod check_commands;

use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::{Context as _, bail},
    clap::{Parser, Subcommand},
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
    voicewatch_channels::{Deliverer, RetryPolicy, SmtpEmailSink, WebhookPushSink},
    voicewatch_config::{Severity, VoicewatchConfig, validate::check_config},
    voicewatch_discord::DiscordOutbound,
    voicewatch_presence::{
        AwaySession, ChannelId, Fanout, PresenceTransition, TransitionKind, UserId,
    },
    voicewatch_relay::{Relay, RelaySettings},
};

#[derive(Parser)]
#[command(name = "voicewatch", about = "Voicewatch: Discord voice-channel notifier")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (overrides discovery in ./ and ~/.config/voicewatch/).
    #[arg(long, global = true, env = "VOICEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and relay voice activity (default).
    Run,
    /// Validate the configuration and report errors/warnings.
    Check {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Send one test alert through every enabled owner sink.
    TestNotify,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<VoicewatchConfig> {
    let path = cli.config.clone().or_else(voicewatch_config::find_config_file);
    let config = voicewatch_config::load_from(path)?;

    let diagnostics = check_config(&config);
    for d in &diagnostics {
        match d.severity {
            Severity::Error => error!(path = %d.path, "{}", d.message),
            Severity::Warning => warn!(path = %d.path, "{}", d.message),
            Severity::Info => info!(path = %d.path, "{}", d.message),
        }
    }
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        bail!("configuration has {errors} error(s); run `voicewatch check` for details");
    }
    Ok(config)
}

/// Email and push sinks, built only when configured and enabled.
fn owner_sinks(config: &VoicewatchConfig, mut deliverer: Deliverer) -> anyhow::Result<Deliverer> {
    if config.notify.email
        && let Some(ref email) = config.email
    {
        let sink = SmtpEmailSink::from_config(email).context("email sink")?;
        deliverer = deliverer.with_email(Arc::new(sink));
    }
    if config.notify.push
        && let Some(ref push) = config.push
    {
        let sink = WebhookPushSink::from_config(push).context("push sink")?;
        deliverer = deliverer.with_push(Arc::new(sink));
    }
    Ok(deliverer.with_retry(RetryPolicy {
        max_retries: config.delivery.max_retries,
        delay: Duration::from_millis(config.delivery.retry_delay_ms),
    }))
}

async fn run(config: VoicewatchConfig) -> anyhow::Result<()> {
    let settings = RelaySettings::from_config(&config)?;
    let http = voicewatch_discord::connect(&config.discord).await?;
    let outbound = Arc::new(DiscordOutbound::new(http));
    let deliverer = owner_sinks(
        &config,
        Deliverer::new()
            .with_direct_message(outbound.clone())
            .with_channel_post(outbound),
    )?;

    info!(
        owner = %settings.owner,
        monitored_channels = settings.monitored.len(),
        "relay configured"
    );
    let relay = Arc::new(Relay::new(settings, deliverer));
    voicewatch_discord::run(&config.discord, relay).await?;
    Ok(())
}

async fn test_notify(config: VoicewatchConfig) -> anyhow::Result<()> {
    let settings = RelaySettings::from_config(&config)?;
    let http = voicewatch_discord::connect(&config.discord).await?;
    let deliverer = owner_sinks(
        &config,
        Deliverer::new().with_direct_message(Arc::new(DiscordOutbound::new(http))),
    )?;

    let channel = config
        .discord
        .monitored_ids()
        .into_iter()
        .next()
        .map(ChannelId::from);
    let transition = PresenceTransition::new(UserId::from("0"), "voicewatch test", None, channel)
        .with_channel_names(None, Some("test channel".into()));
    let fanout = Fanout::new(settings.owner, settings.sinks, settings.renderer);
    let invocations = fanout.dispatch(TransitionKind::Joined, &transition, &AwaySession::new());

    let report = deliverer.deliver_all(invocations).await;
    info!(
        delivered = report.delivered,
        failed = report.failed,
        skipped = report.skipped,
        "test notification sent"
    );
    if report.failed > 0 {
        bail!("{} test notification(s) failed", report.failed);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "voicewatch starting");

    match cli.command {
        None | Some(Commands::Run) => run(load_config(&cli)?).await,
        Some(Commands::Check { verbose }) => {
            check_commands::handle_check(cli.config.as_deref(), verbose)
        },
        Some(Commands::TestNotify) => test_notify(load_config(&cli)?).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "voicewatch",
            "check",
            "--verbose",
            "--config",
            "/tmp/vw.toml",
            "--json-logs",
        ])
        .unwrap();
        assert!(cli.json_logs);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/vw.toml")));
        assert!(matches!(cli.command, Some(Commands::Check { verbose: true })));
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["voicewatch"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn unparsable_config_stops_startup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicewatch.toml");
        std::fs::write(&path, "[discord\nowner_id = \"1\"\n").unwrap();
        let cli = Cli::try_parse_from(["voicewatch", "--config", path.to_str().unwrap()]).unwrap();
        let err = load_config(&cli).unwrap_err();
        assert!(err.to_string().contains("invalid TOML config"), "{err}");
    }

    #[test]
    fn explicit_config_with_errors_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voicewatch.toml");
        std::fs::write(
            &path,
            "[discord]\ntoken = \"t\"\nowner_id = \"1\"\nmonitored_channels = [\"2\"]\n\n[display]\ntimezone = \"Mars/Olympus\"\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from(["voicewatch", "--config", path.to_str().unwrap()]).unwrap();
        assert!(load_config(&cli).is_err());
    }
}
