mod bootstrap;

use anyhow::Result;
use herald_core::config::{AppConfig, LoadOptions};
use herald_discord::commands::default_commands;

fn init_logging(config: &AppConfig) {
    use herald_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    // Reuse the same config we already loaded instead of reading it twice
    let app = bootstrap::bootstrap_with_config(config);

    if let Some(application_id) = app.config.discord.application_id.as_deref() {
        // Command registration failures are not fatal; the bot still
        // handles gateway traffic without slash commands.
        if let Err(error) = app.rest.register_commands(application_id, &default_commands()).await {
            tracing::warn!(
                event_name = "system.bot.command_registration_failed",
                correlation_id = "bootstrap",
                thread_id = "unknown",
                error = %error,
                "slash command registration failed"
            );
        }
    }

    tracing::info!(
        event_name = "system.bot.gateway_transport_mode",
        transport_mode = if app.runner.is_noop_transport() { "noop" } else { "websocket" },
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "gateway runner transport mode initialized"
    );

    app.runner.start().await?;

    tracing::info!(
        event_name = "system.bot.started",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "herald-bot started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.bot.stopping",
        correlation_id = "shutdown",
        thread_id = "unknown",
        "herald-bot stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
