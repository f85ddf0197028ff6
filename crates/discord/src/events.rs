use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use herald_core::TagVocabulary;

use crate::api::{ApiError, ChannelKind, DiscordApi, ForumThread};
use crate::commands::{PING_COMMAND, PING_TRIGGER, PONG_REPLY};
use crate::coordinator::TagUpdateCoordinator;
use crate::embeds::{AllowedMentions, OutboundMessage};
use crate::messages::{announcement_message, pick_first_image_url, thread_embed};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEnvelope {
    pub sequence: Option<u64>,
    pub event: GatewayEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    ThreadCreated(ForumThread),
    ThreadUpdated { old: ForumThread, new: ForumThread },
    MessageCreated(ChannelMessage),
    InteractionCreated(CommandInteraction),
    Unsupported { event_type: String },
}

impl GatewayEvent {
    pub fn event_type(&self) -> GatewayEventType {
        match self {
            Self::ThreadCreated(_) => GatewayEventType::ThreadCreated,
            Self::ThreadUpdated { .. } => GatewayEventType::ThreadUpdated,
            Self::MessageCreated(_) => GatewayEventType::MessageCreated,
            Self::InteractionCreated(_) => GatewayEventType::InteractionCreated,
            Self::Unsupported { .. } => GatewayEventType::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    ThreadCreated,
    ThreadUpdated,
    MessageCreated,
    InteractionCreated,
    Unsupported,
}

/// A slash-command invocation; the id/token pair addresses the one-shot
/// reply callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandInteraction {
    pub id: String,
    pub token: String,
    pub command_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelMessage {
    pub channel_id: String,
    pub author_id: String,
    pub author_is_bot: bool,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Processed,
    Ignored,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> GatewayEventType;
    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<GatewayEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Announces freshly created forum threads into the announce channel.
pub struct ThreadCreateHandler {
    api: Arc<dyn DiscordApi>,
    vocab: Arc<TagVocabulary>,
    forum_channel_id: String,
    announce_channel_id: String,
    /// Lets the starter message and its attachments finish propagating
    /// before the preview embed is built.
    announce_delay: Duration,
}

impl ThreadCreateHandler {
    pub fn new(
        api: Arc<dyn DiscordApi>,
        vocab: Arc<TagVocabulary>,
        forum_channel_id: impl Into<String>,
        announce_channel_id: impl Into<String>,
        announce_delay: Duration,
    ) -> Self {
        Self {
            api,
            vocab,
            forum_channel_id: forum_channel_id.into(),
            announce_channel_id: announce_channel_id.into(),
            announce_delay,
        }
    }
}

#[async_trait]
impl EventHandler for ThreadCreateHandler {
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::ThreadCreated
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::ThreadCreated(thread) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if thread.parent_id.as_deref() != Some(self.forum_channel_id.as_str()) {
            return Ok(HandlerResult::Ignored);
        }

        let channel = match self.api.fetch_channel(&self.announce_channel_id).await? {
            Some(channel) if channel.kind == ChannelKind::Text => channel,
            Some(channel) => {
                warn!(
                    event_name = "forum.announce.bad_destination",
                    channel_id = %self.announce_channel_id,
                    kind = ?channel.kind,
                    "announce channel is not a text channel"
                );
                return Ok(HandlerResult::Processed);
            }
            None => {
                warn!(
                    event_name = "forum.announce.bad_destination",
                    channel_id = %self.announce_channel_id,
                    "announce channel could not be found"
                );
                return Ok(HandlerResult::Processed);
            }
        };

        if !self.announce_delay.is_zero() {
            tokio::time::sleep(self.announce_delay).await;
        }

        let starter = self.api.first_thread_message(&thread.id).await?.unwrap_or_default();
        let image = pick_first_image_url(&starter.attachments);
        let embed = thread_embed(thread, &starter.content, image, Utc::now());

        let content = format!("@everyone\n{}", announcement_message(thread, &self.vocab));
        let message = OutboundMessage {
            content,
            embeds: vec![embed],
            allowed_mentions: AllowedMentions::broadcast(),
        };
        self.api.send_message(&channel.id, &message).await?;

        Ok(HandlerResult::Processed)
    }
}

/// Feeds tag-set changes into the debounce coordinator.
pub struct ThreadUpdateHandler {
    coordinator: Arc<TagUpdateCoordinator>,
    forum_channel_id: String,
}

impl ThreadUpdateHandler {
    pub fn new(coordinator: Arc<TagUpdateCoordinator>, forum_channel_id: impl Into<String>) -> Self {
        Self { coordinator, forum_channel_id: forum_channel_id.into() }
    }
}

#[async_trait]
impl EventHandler for ThreadUpdateHandler {
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::ThreadUpdated
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::ThreadUpdated { old, new } = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if new.parent_id.as_deref() != Some(self.forum_channel_id.as_str()) {
            return Ok(HandlerResult::Ignored);
        }

        self.coordinator.observe_tag_update(&new.id, &old.applied_tags, &new.applied_tags);
        Ok(HandlerResult::Processed)
    }
}

/// Ping utility: replies `pong 🏓` to `!ping`, ignoring bot authors.
pub struct PingHandler {
    api: Arc<dyn DiscordApi>,
}

impl PingHandler {
    pub fn new(api: Arc<dyn DiscordApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for PingHandler {
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::MessageCreated
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::MessageCreated(message) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if message.author_is_bot || message.content != PING_TRIGGER {
            return Ok(HandlerResult::Processed);
        }

        self.api.send_message(&message.channel_id, &OutboundMessage::text(PONG_REPLY)).await?;
        Ok(HandlerResult::Processed)
    }
}

/// Answers registered slash commands; `/ping` mirrors the `!ping`
/// message reply.
pub struct SlashCommandHandler {
    api: Arc<dyn DiscordApi>,
}

impl SlashCommandHandler {
    pub fn new(api: Arc<dyn DiscordApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> GatewayEventType {
        GatewayEventType::InteractionCreated
    }

    async fn handle(
        &self,
        envelope: &GatewayEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let GatewayEvent::InteractionCreated(interaction) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        if interaction.command_name != PING_COMMAND {
            return Ok(HandlerResult::Processed);
        }

        self.api
            .respond_to_interaction(
                &interaction.id,
                &interaction.token,
                &OutboundMessage::text(PONG_REPLY),
            )
            .await?;
        Ok(HandlerResult::Processed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use herald_core::config::{TagRole, TagsConfig};
    use herald_core::TagVocabulary;

    use super::{
        ChannelMessage, CommandInteraction, EventContext, EventDispatcher, EventHandler,
        GatewayEnvelope, GatewayEvent, HandlerResult, PingHandler, SlashCommandHandler,
        ThreadCreateHandler, ThreadUpdateHandler,
    };
    use crate::api::{
        ApiError, ChannelInfo, ChannelKind, DiscordApi, ForumThread, ThreadMessage,
    };
    use crate::coordinator::{
        CoordinatorConfig, SystemClock, TagUpdateCoordinator, TokioScheduler,
    };
    use crate::embeds::OutboundMessage;

    #[derive(Default)]
    struct RecordingApi {
        channel: Option<ChannelInfo>,
        starter: Option<ThreadMessage>,
        sent: Mutex<Vec<(String, OutboundMessage)>>,
        interaction_replies: Mutex<Vec<(String, OutboundMessage)>>,
    }

    #[async_trait]
    impl DiscordApi for RecordingApi {
        async fn fetch_channel(&self, _channel_id: &str) -> Result<Option<ChannelInfo>, ApiError> {
            Ok(self.channel.clone())
        }

        async fn fetch_thread(&self, _thread_id: &str) -> Result<Option<ForumThread>, ApiError> {
            Ok(None)
        }

        async fn first_thread_message(
            &self,
            _thread_id: &str,
        ) -> Result<Option<ThreadMessage>, ApiError> {
            Ok(self.starter.clone())
        }

        async fn send_message(
            &self,
            channel_id: &str,
            message: &OutboundMessage,
        ) -> Result<(), ApiError> {
            self.sent.lock().await.push((channel_id.to_string(), message.clone()));
            Ok(())
        }

        async fn respond_to_interaction(
            &self,
            interaction_id: &str,
            _token: &str,
            message: &OutboundMessage,
        ) -> Result<(), ApiError> {
            self.interaction_replies
                .lock()
                .await
                .push((interaction_id.to_string(), message.clone()));
            Ok(())
        }
    }

    fn vocabulary() -> TagVocabulary {
        TagVocabulary::new(TagsConfig {
            looking_for_players: Some(TagRole { id: "lfp".to_string(), emoji: None }),
            ..TagsConfig::default()
        })
    }

    fn thread(parent: &str, tags: &[&str]) -> ForumThread {
        ForumThread {
            id: "t-1".to_string(),
            name: "Wyprawa".to_string(),
            url: "https://discord.com/channels/1/2".to_string(),
            owner_id: "owner-1".to_string(),
            parent_id: Some(parent.to_string()),
            applied_tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn text_channel_api() -> RecordingApi {
        RecordingApi {
            channel: Some(ChannelInfo {
                id: "announce".to_string(),
                kind: ChannelKind::Text,
                name: "ogłoszenia".to_string(),
            }),
            starter: Some(ThreadMessage {
                content: "Opis".to_string(),
                attachments: Vec::new(),
            }),
            ..RecordingApi::default()
        }
    }

    fn create_handler(api: Arc<RecordingApi>) -> ThreadCreateHandler {
        ThreadCreateHandler::new(
            api,
            Arc::new(vocabulary()),
            "forum",
            "announce",
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn thread_create_announces_with_broadcast_mentions() {
        let api = Arc::new(text_channel_api());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(create_handler(api.clone()));

        let envelope = GatewayEnvelope {
            sequence: Some(1),
            event: GatewayEvent::ThreadCreated(thread("forum", &["lfp"])),
        };
        let result = dispatcher
            .dispatch(&envelope, &EventContext::default())
            .await
            .expect("dispatch should succeed");
        assert_eq!(result, HandlerResult::Processed);

        let sent = api.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "announce");
        assert!(sent[0].1.content.starts_with("@everyone\n"));
        assert!(sent[0].1.content.contains("nabory"));
        assert!(sent[0].1.allowed_mentions.allows_everyone());
        assert_eq!(sent[0].1.embeds.len(), 1);
        assert_eq!(sent[0].1.embeds[0].description.as_deref(), Some("Opis"));
    }

    #[tokio::test]
    async fn thread_create_outside_forum_is_ignored() {
        let api = Arc::new(text_channel_api());
        let handler = create_handler(api.clone());

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::ThreadCreated(thread("other-channel", &[])),
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Ignored);
        assert!(api.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn thread_create_with_missing_announce_channel_aborts_quietly() {
        let api = Arc::new(RecordingApi::default());
        let handler = create_handler(api.clone());

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::ThreadCreated(thread("forum", &[])),
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Processed);
        assert!(api.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn dispatcher_ignores_events_without_a_handler() {
        let dispatcher = EventDispatcher::new();
        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::Unsupported { event_type: "GUILD_UPDATE".to_string() },
        };
        let result = dispatcher
            .dispatch(&envelope, &EventContext::default())
            .await
            .expect("dispatch should succeed");
        assert_eq!(result, HandlerResult::Ignored);
    }

    fn tag_coordinator(api: Arc<RecordingApi>) -> Arc<TagUpdateCoordinator> {
        Arc::new(TagUpdateCoordinator::new(
            api,
            Arc::new(vocabulary()),
            Arc::new(TokioScheduler),
            Arc::new(SystemClock),
            CoordinatorConfig {
                announce_channel_id: "announce".to_string(),
                debounce: Duration::from_secs(60),
                cooldown: Duration::from_secs(600),
            },
        ))
    }

    #[tokio::test]
    async fn thread_update_inside_forum_feeds_the_coordinator() {
        let api = Arc::new(text_channel_api());
        let coordinator = tag_coordinator(api);
        let handler = ThreadUpdateHandler::new(coordinator.clone(), "forum");

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::ThreadUpdated {
                old: thread("forum", &[]),
                new: thread("forum", &["lfp"]),
            },
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Processed);
        assert_eq!(coordinator.pending_update_count(), 1);
    }

    #[tokio::test]
    async fn thread_update_outside_forum_is_ignored() {
        let api = Arc::new(text_channel_api());
        let coordinator = tag_coordinator(api);
        let handler = ThreadUpdateHandler::new(coordinator.clone(), "forum");

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::ThreadUpdated {
                old: thread("other-channel", &[]),
                new: thread("other-channel", &["lfp"]),
            },
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Ignored);
        assert_eq!(coordinator.pending_update_count(), 0);
    }

    #[tokio::test]
    async fn slash_ping_command_is_answered() {
        let api = Arc::new(RecordingApi::default());
        let handler = SlashCommandHandler::new(api.clone());

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::InteractionCreated(CommandInteraction {
                id: "i-1".to_string(),
                token: "callback-token".to_string(),
                command_name: "ping".to_string(),
            }),
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Processed);

        let replies = api.interaction_replies.lock().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "i-1");
        assert_eq!(replies[0].1.content, "pong 🏓");
    }

    #[tokio::test]
    async fn unknown_slash_command_gets_no_reply() {
        let api = Arc::new(RecordingApi::default());
        let handler = SlashCommandHandler::new(api.clone());

        let envelope = GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::InteractionCreated(CommandInteraction {
                id: "i-2".to_string(),
                token: "callback-token".to_string(),
                command_name: "help".to_string(),
            }),
        };
        let result = handler
            .handle(&envelope, &EventContext::default())
            .await
            .expect("handler should not fail");
        assert_eq!(result, HandlerResult::Processed);
        assert!(api.interaction_replies.lock().await.is_empty());
    }

    #[tokio::test]
    async fn ping_replies_pong_but_not_to_bots() {
        let api = Arc::new(RecordingApi::default());
        let handler = PingHandler::new(api.clone());

        let ping = |is_bot: bool| GatewayEnvelope {
            sequence: None,
            event: GatewayEvent::MessageCreated(ChannelMessage {
                channel_id: "c-1".to_string(),
                author_id: "u-1".to_string(),
                author_is_bot: is_bot,
                content: "!ping".to_string(),
            }),
        };

        handler.handle(&ping(true), &EventContext::default()).await.expect("bot ping");
        assert!(api.sent.lock().await.is_empty());

        handler.handle(&ping(false), &EventContext::default()).await.expect("user ping");
        let sent = api.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.content, "pong 🏓");
    }
}
