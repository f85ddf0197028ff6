//! Pure composition of announcement and status-update copy. No I/O; every
//! function maps a thread snapshot plus the vocabulary to text or an embed.

use chrono::{DateTime, Utc};

use herald_core::{StatusAction, TagVocabulary};

use crate::api::{Attachment, ForumThread};
use crate::embeds::{AllowedMentions, Embed, EmbedBuilder};

const EMPTY_DESCRIPTION: &str = "*Brak informacji...*";

/// Creation announcement, gender-agreed to the thread's kind, with a
/// recruitment call-to-action when the initial tag set already marks the
/// thread as looking for players.
pub fn announcement_message(thread: &ForumThread, vocab: &TagVocabulary) -> String {
    let kind = vocab.kind_of(&thread.applied_tags);
    let copy = vocab.copy_for(kind);
    let grammar = vocab.grammar_for(kind);

    let mut lines = vec![format!(
        "Właśnie wleciała {} **{}{}**! {} poprowadzi {}.",
        grammar.nowy,
        copy.label,
        copy.emoji,
        grammar.ktory,
        owner_mention(thread),
    )];

    if vocab.is_looking_for_players(&thread.applied_tags) {
        lines.push(format!(
            "🎯 Właśnie trwają nabory do {} — aby się zgłosić wejdź na **{}** i napisz *\"Zgłaszam się!\"*",
            copy.recruitment_noun,
            thread_link(thread),
        ));
    }

    lines.join("\n")
}

pub fn status_update_message(
    thread: &ForumThread,
    vocab: &TagVocabulary,
    action: StatusAction,
) -> String {
    match action {
        StatusAction::LookingForPlayers => looking_for_players_update(thread, vocab),
        StatusAction::Active => active_update(thread, vocab),
        StatusAction::Inactive => inactive_update(thread, vocab),
        StatusAction::TemporarilyInactive => temporarily_inactive_update(thread, vocab),
    }
}

/// Mention-control directive matching the message's intent: recruitment is
/// a broad broadcast, the other status updates only notify the owner.
pub fn mention_directive(action: StatusAction) -> AllowedMentions {
    match action {
        StatusAction::LookingForPlayers => AllowedMentions::broadcast(),
        _ => AllowedMentions::users_only(),
    }
}

fn looking_for_players_update(thread: &ForumThread, vocab: &TagVocabulary) -> String {
    [
        "@everyone".to_string(),
        "Szukasz sesji? Mamy coś dla Ciebie!".to_string(),
        format!(
            "🎯 W tym momencie zaczynają się nabory do **{}** — aby się zgłosić napisz *\"Zgłaszam się!\"* w wątku. {}",
            thread_link(thread),
            vocab.status_emoji(StatusAction::LookingForPlayers),
        ),
    ]
    .join("\n")
}

fn active_update(thread: &ForumThread, vocab: &TagVocabulary) -> String {
    let kind = vocab.kind_of(&thread.applied_tags);
    let copy = vocab.copy_for(kind);
    let grammar = vocab.grammar_for(kind);

    format!(
        "{}{} **{}** prowadzon{} przez {} właśnie jest aktywn{}! {}",
        copy.emoji,
        copy.label,
        thread.name,
        grammar.prowadzon,
        owner_mention(thread),
        grammar.aktywn,
        vocab.status_emoji(StatusAction::Active),
    )
}

fn inactive_update(thread: &ForumThread, vocab: &TagVocabulary) -> String {
    let kind = vocab.kind_of(&thread.applied_tags);
    let copy = vocab.copy_for(kind);
    let grammar = vocab.grammar_for(kind);

    format!(
        "{}{} **{}** prowadzon{} przez {} właśnie się zakończy{}! {}",
        copy.emoji,
        copy.label,
        thread.name,
        grammar.prowadzon,
        owner_mention(thread),
        grammar.zakonczyl,
        vocab.status_emoji(StatusAction::Inactive),
    )
}

fn temporarily_inactive_update(thread: &ForumThread, vocab: &TagVocabulary) -> String {
    let kind = vocab.kind_of(&thread.applied_tags);
    let copy = vocab.copy_for(kind);
    let grammar = vocab.grammar_for(kind);

    format!(
        "{}{} **{}** prowadzon{} przez {} właśnie zosta{} zawieszon{}! {}",
        copy.emoji,
        copy.label,
        thread.name,
        grammar.prowadzon,
        owner_mention(thread),
        grammar.zakonczyl,
        grammar.aktywn,
        vocab.status_emoji(StatusAction::TemporarilyInactive),
    )
}

/// Preview panel: thread name as title, link, truncated starter content,
/// optional leading image.
pub fn thread_embed(
    thread: &ForumThread,
    initial_content: &str,
    image_url: Option<&str>,
    at: DateTime<Utc>,
) -> Embed {
    let description = initial_content.trim();
    let description = if description.is_empty() { EMPTY_DESCRIPTION } else { description };

    let mut builder = EmbedBuilder::new()
        .title(&thread.name)
        .url(&thread.url)
        .description(description)
        .timestamp(at);

    if let Some(url) = image_url {
        builder = builder.image(url);
    }

    builder.build()
}

/// First attachment that declares an image content type, or whose URL ends
/// with an image-like extension as a fallback.
pub fn pick_first_image_url(attachments: &[Attachment]) -> Option<&str> {
    attachments.iter().find_map(|attachment| {
        if attachment.url.is_empty() {
            return None;
        }
        if attachment.content_type.as_deref().is_some_and(|ct| ct.starts_with("image/")) {
            return Some(attachment.url.as_str());
        }
        if has_image_extension(&attachment.url) {
            return Some(attachment.url.as_str());
        }
        None
    })
}

fn has_image_extension(url: &str) -> bool {
    let lowered = url.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".webp"].iter().any(|ext| lowered.ends_with(ext))
}

fn owner_mention(thread: &ForumThread) -> String {
    format!("<@{}>", thread.owner_id)
}

fn thread_link(thread: &ForumThread) -> String {
    format!("[{}]({})", thread.name, thread.url)
}
