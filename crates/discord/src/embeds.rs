use chrono::{DateTime, Utc};
use serde::Serialize;

/// Hard cap Discord places on an embed description.
pub const DESCRIPTION_LIMIT: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Default)]
pub struct EmbedBuilder {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    image: Option<EmbedImage>,
    timestamp: Option<DateTime<Utc>>,
}

impl EmbedBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Description beyond the embed character budget is truncated with an
    /// ellipsis marker rather than rejected.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(truncate_description(&description.into()));
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(EmbedImage { url: url.into() });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    pub fn build(self) -> Embed {
        Embed {
            title: self.title,
            url: self.url,
            description: self.description,
            image: self.image,
            timestamp: self.timestamp,
        }
    }
}

fn truncate_description(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let kept: String = description.chars().take(DESCRIPTION_LIMIT - 3).collect();
    format!("{kept}...")
}

/// Which mention classes the platform honors versus strips for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionClass {
    Users,
    Roles,
    Everyone,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<MentionClass>,
}

impl AllowedMentions {
    /// Broad broadcast: `@everyone` plus user mentions are honored.
    pub fn broadcast() -> Self {
        Self { parse: vec![MentionClass::Users, MentionClass::Everyone] }
    }

    /// Owner-notification only: user mentions honored, broadcast stripped.
    pub fn users_only() -> Self {
        Self { parse: vec![MentionClass::Users] }
    }

    pub fn allows_everyone(&self) -> bool {
        self.parse.contains(&MentionClass::Everyone)
    }
}

/// Payload accepted by the send capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    pub allowed_mentions: AllowedMentions,
}

impl OutboundMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            embeds: Vec::new(),
            allowed_mentions: AllowedMentions::users_only(),
        }
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn with_mentions(mut self, allowed_mentions: AllowedMentions) -> Self {
        self.allowed_mentions = allowed_mentions;
        self
    }
}
