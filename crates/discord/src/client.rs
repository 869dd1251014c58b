use std::sync::Arc;

use {
    secrecy::ExposeSecret,
    serenity::all::{Client, Http},
    tracing::{info, warn},
    voicewatch_config::DiscordConfig,
    voicewatch_relay::Relay,
};

use crate::{Error, Result, handler::VoiceHandler};

/// REST client for outbound messages, checked against the API before use.
pub async fn connect(config: &DiscordConfig) -> Result<Arc<Http>> {
    if !config.has_token() {
        return Err(Error::message("discord token is not configured"));
    }
    let http = Http::new(config.token.expose_secret());
    let me = http.get_current_user().await?;
    info!(bot_name = %me.name, bot_id = %me.id, "discord credentials verified");
    Ok(Arc::new(http))
}

/// Connect to the gateway and process events until shutdown.
pub async fn run(config: &DiscordConfig, relay: Arc<Relay>) -> Result<()> {
    let handler = VoiceHandler::new(relay)?;
    let mut client = Client::builder(config.token.expose_secret(), VoiceHandler::intents())
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested, closing gateway connection");
                shard_manager.shutdown_all().await;
            },
            Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    info!("connecting to discord gateway");
    client.start().await?;
    info!("discord gateway connection closed");
    Ok(())
}
