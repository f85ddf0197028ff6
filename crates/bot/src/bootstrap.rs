use std::sync::Arc;
use std::time::Duration;

use herald_core::config::AppConfig;
use herald_core::vocabulary::TagVocabulary;
use herald_discord::coordinator::{
    CoordinatorConfig, SystemClock, TagUpdateCoordinator, TokioScheduler,
};
use herald_discord::events::{
    EventDispatcher, PingHandler, SlashCommandHandler, ThreadCreateHandler, ThreadUpdateHandler,
};
use herald_discord::gateway::{GatewayRunner, ReconnectPolicy};
use herald_discord::rest::RestClient;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub rest: Arc<RestClient>,
    pub runner: GatewayRunner,
}

pub fn bootstrap_with_config(config: AppConfig) -> Application {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        thread_id = "unknown",
        "starting application bootstrap"
    );

    let rest = Arc::new(RestClient::new(config.discord.bot_token.clone()));
    let vocab = Arc::new(TagVocabulary::new(config.forum.tags.clone()));

    let coordinator = Arc::new(TagUpdateCoordinator::new(
        rest.clone(),
        vocab.clone(),
        Arc::new(TokioScheduler),
        Arc::new(SystemClock),
        CoordinatorConfig {
            announce_channel_id: config.forum.announce_channel_id.clone(),
            debounce: Duration::from_secs(config.forum.debounce_secs),
            cooldown: Duration::from_secs(config.forum.cooldown_secs),
        },
    ));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ThreadCreateHandler::new(
        rest.clone(),
        vocab,
        config.forum.forum_channel_id.clone(),
        config.forum.announce_channel_id.clone(),
        Duration::from_secs(config.forum.announce_delay_secs),
    ));
    dispatcher.register(ThreadUpdateHandler::new(
        coordinator,
        config.forum.forum_channel_id.clone(),
    ));
    dispatcher.register(PingHandler::new(rest.clone()));
    dispatcher.register(SlashCommandHandler::new(rest.clone()));

    let runner = GatewayRunner::with_noop_transport(dispatcher, ReconnectPolicy::default());

    Application { config, rest, runner }
}
