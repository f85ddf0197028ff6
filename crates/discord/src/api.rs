use async_trait::async_trait;
use thiserror::Error;

use crate::embeds::OutboundMessage;

/// A fetched channel, reduced to what the handlers check: its identity and
/// whether it is the right kind of destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub kind: ChannelKind,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Text,
    Forum,
    PublicThread,
    PrivateThread,
    Other,
}

impl ChannelKind {
    /// Maps the wire `type` discriminant.
    pub fn from_api(value: u8) -> Self {
        match value {
            0 => Self::Text,
            11 => Self::PublicThread,
            12 => Self::PrivateThread,
            15 => Self::Forum,
            _ => Self::Other,
        }
    }

    pub fn is_thread(self) -> bool {
        matches!(self, Self::PublicThread | Self::PrivateThread)
    }
}

/// Snapshot of a forum thread as delivered by the gateway or re-fetched at
/// evaluation time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForumThread {
    pub id: String,
    pub name: String,
    pub url: String,
    pub owner_id: String,
    pub parent_id: Option<String>,
    pub applied_tags: Vec<String>,
}

/// The thread's starter message, used for the preview embed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub url: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("discord api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("discord api returned status {status} for `{endpoint}`")]
    Status { status: u16, endpoint: String },
}

/// Boundary to the external send/fetch capability. Fetches return `None`
/// for gone-or-never-existed targets so callers can abort quietly instead
/// of treating deletion races as failures.
#[async_trait]
pub trait DiscordApi: Send + Sync {
    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<ChannelInfo>, ApiError>;
    async fn fetch_thread(&self, thread_id: &str) -> Result<Option<ForumThread>, ApiError>;
    async fn first_thread_message(
        &self,
        thread_id: &str,
    ) -> Result<Option<ThreadMessage>, ApiError>;
    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutboundMessage,
    ) -> Result<(), ApiError>;
    async fn respond_to_interaction(
        &self,
        interaction_id: &str,
        token: &str,
        message: &OutboundMessage,
    ) -> Result<(), ApiError>;
}
