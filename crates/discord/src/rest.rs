//! Discord REST client backing the `DiscordApi` boundary: channel and
//! thread lookups plus message delivery, with 404s surfaced as `None` so
//! deletion races stay quiet.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::{
    ApiError, Attachment, ChannelInfo, ChannelKind, DiscordApi, ForumThread, ThreadMessage,
};
use crate::commands::ApplicationCommand;
use crate::embeds::OutboundMessage;

const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

pub struct RestClient {
    http: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl RestClient {
    pub fn new(token: SecretString) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(token: SecretString, base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), token, base_url: base_url.into() }
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token.expose_secret())
    }

    async fn get_json<T>(&self, path: &str) -> Result<Option<T>, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response =
            self.http.get(&url).header(AUTHORIZATION, self.authorization()).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                endpoint: path.to_string(),
            });
        }

        Ok(Some(response.json().await?))
    }

    /// Bulk-overwrites the application's global slash commands.
    pub async fn register_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> Result<(), ApiError> {
        let path = format!("/applications/{application_id}/commands");
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .put(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(commands)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status { status: response.status().as_u16(), endpoint: path });
        }
        Ok(())
    }
}

#[async_trait]
impl DiscordApi for RestClient {
    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, ApiError> {
        let payload: Option<ChannelPayload> =
            self.get_json(&format!("/channels/{channel_id}")).await?;
        Ok(payload.map(ChannelPayload::into_channel_info))
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<ForumThread>, ApiError> {
        let payload: Option<ChannelPayload> =
            self.get_json(&format!("/channels/{thread_id}")).await?;
        Ok(payload.and_then(ChannelPayload::into_forum_thread))
    }

    async fn first_thread_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadMessage>, ApiError> {
        // A forum thread's starter message shares the thread's id.
        let payload: Option<MessagePayload> =
            self.get_json(&format!("/channels/{thread_id}/messages/{thread_id}")).await?;
        Ok(payload.map(MessagePayload::into_thread_message))
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ApiError> {
        let path = format!("/channels/{channel_id}/messages");
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, self.authorization())
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status { status: response.status().as_u16(), endpoint: path });
        }
        Ok(())
    }

    async fn respond_to_interaction(
        &self,
        interaction_id: &str,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<(), ApiError> {
        let path = format!("/interactions/{interaction_id}/{token}/callback");
        let url = format!("{}{}", self.base_url, path);
        // Interaction callbacks authenticate through the token embedded
        // in the path, not the bot token.
        let response = self
            .http
            .post(&url)
            .json(&InteractionResponse { kind: CHANNEL_MESSAGE_WITH_SOURCE, data: message })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status { status: response.status().as_u16(), endpoint: path });
        }
        Ok(())
    }
}

/// Interaction callback type 4: reply with a channel message.
const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;

#[derive(Serialize)]
struct InteractionResponse<'a> {
    #[serde(rename = "type")]
    kind: u8,
    data: &'a OutboundMessage,
}

#[derive(Debug, Deserialize)]
struct ChannelPayload {
    id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    owner_id: Option<String>,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    applied_tags: Vec<String>,
}

impl ChannelPayload {
    fn into_channel_info(self) -> ChannelInfo {
        ChannelInfo {
            kind: ChannelKind::from_api(self.kind),
            name: self.name.unwrap_or_default(),
            id: self.id,
        }
    }

    fn into_forum_thread(self) -> Option<ForumThread> {
        if !ChannelKind::from_api(self.kind).is_thread() {
            return None;
        }
        Some(ForumThread {
            url: thread_url(self.guild_id.as_deref(), &self.id),
            name: self.name.unwrap_or_default(),
            owner_id: self.owner_id.unwrap_or_default(),
            parent_id: self.parent_id,
            applied_tags: self.applied_tags,
            id: self.id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<AttachmentPayload>,
}

impl MessagePayload {
    fn into_thread_message(self) -> ThreadMessage {
        ThreadMessage {
            content: self.content,
            attachments: self
                .attachments
                .into_iter()
                .map(|attachment| Attachment {
                    url: attachment.url,
                    content_type: attachment.content_type,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AttachmentPayload {
    url: String,
    #[serde(default)]
    content_type: Option<String>,
}

fn thread_url(guild_id: Option<&str>, thread_id: &str) -> String {
    format!("https://discord.com/channels/{}/{}", guild_id.unwrap_or("@me"), thread_id)
}
