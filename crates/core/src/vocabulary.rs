use crate::config::{TagRole, TagsConfig};

/// Mutually exclusive classification of a forum thread, derived from its
/// applied tags in fixed priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadKind {
    Campaign,
    Oneshot,
    Adventure,
    Session,
}

impl ThreadKind {
    /// The Polish copy inflects masculine only for oneshots; every other
    /// kind (kampania, przygoda, sesja) is feminine.
    pub fn is_masculine(self) -> bool {
        matches!(self, Self::Oneshot)
    }
}

/// One of the four status-change notification triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusAction {
    LookingForPlayers,
    Active,
    Inactive,
    TemporarilyInactive,
}

impl StatusAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::LookingForPlayers => "looking_for_players",
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::TemporarilyInactive => "temporarily_inactive",
        }
    }
}

/// Display copy for a thread kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindCopy {
    pub label: &'static str,
    /// Rendered directly after the label; carries a trailing space when a
    /// tag emoji is configured, empty otherwise.
    pub emoji: String,
    pub recruitment_noun: &'static str,
}

/// Gender-agreed inflections for the message templates, keyed by kind and
/// consulted once per compose call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grammar {
    pub nowy: &'static str,
    pub ktory: &'static str,
    pub prowadzon: &'static str,
    pub aktywn: &'static str,
    pub zakonczyl: &'static str,
}

const MASCULINE: Grammar =
    Grammar { nowy: "nowy", ktory: "który", prowadzon: "y", aktywn: "y", zakonczyl: "ł" };
const FEMININE: Grammar =
    Grammar { nowy: "nowa", ktory: "która", prowadzon: "a", aktywn: "a", zakonczyl: "ła" };

/// Fixed mapping from semantic tag roles to opaque tag identifiers and
/// display copy. Pure lookup, built once from configuration.
#[derive(Clone, Debug)]
pub struct TagVocabulary {
    tags: TagsConfig,
}

impl TagVocabulary {
    pub fn new(tags: TagsConfig) -> Self {
        Self { tags }
    }

    /// Kind priority: campaign (or its server-campaign alias), then
    /// oneshot, then adventure, else session.
    pub fn kind_of(&self, applied: &[String]) -> ThreadKind {
        if self.has_role(&self.tags.campaign, applied)
            || self.has_role(&self.tags.server_campaign, applied)
        {
            return ThreadKind::Campaign;
        }
        if self.has_role(&self.tags.oneshot, applied) {
            return ThreadKind::Oneshot;
        }
        if self.has_role(&self.tags.adventure, applied) {
            return ThreadKind::Adventure;
        }
        ThreadKind::Session
    }

    pub fn copy_for(&self, kind: ThreadKind) -> KindCopy {
        match kind {
            ThreadKind::Campaign => KindCopy {
                label: "kampania",
                emoji: role_emoji(&self.tags.campaign),
                recruitment_noun: "tej kampanii",
            },
            ThreadKind::Oneshot => KindCopy {
                label: "oneshot",
                emoji: role_emoji(&self.tags.oneshot),
                recruitment_noun: "tego oneshota",
            },
            ThreadKind::Adventure => KindCopy {
                label: "przygoda",
                emoji: role_emoji(&self.tags.adventure),
                recruitment_noun: "tej przygody",
            },
            ThreadKind::Session => KindCopy {
                label: "sesja",
                emoji: String::new(),
                recruitment_noun: "tej sesji",
            },
        }
    }

    pub fn grammar_for(&self, kind: ThreadKind) -> Grammar {
        if kind.is_masculine() {
            MASCULINE
        } else {
            FEMININE
        }
    }

    /// Status tags in notification priority order. "Looking for players"
    /// is the most time-sensitive, so it wins when one edit adds several
    /// status tags at once.
    pub fn status_pairs(&self) -> [(Option<&str>, StatusAction); 4] {
        [
            (role_id(&self.tags.looking_for_players), StatusAction::LookingForPlayers),
            (role_id(&self.tags.active), StatusAction::Active),
            (role_id(&self.tags.inactive), StatusAction::Inactive),
            (role_id(&self.tags.temporarily_inactive), StatusAction::TemporarilyInactive),
        ]
    }

    pub fn status_emoji(&self, action: StatusAction) -> String {
        let role = match action {
            StatusAction::LookingForPlayers => &self.tags.looking_for_players,
            StatusAction::Active => &self.tags.active,
            StatusAction::Inactive => &self.tags.inactive,
            StatusAction::TemporarilyInactive => &self.tags.temporarily_inactive,
        };
        role_emoji(role)
    }

    pub fn is_looking_for_players(&self, applied: &[String]) -> bool {
        self.has_role(&self.tags.looking_for_players, applied)
    }

    fn has_role(&self, role: &Option<TagRole>, applied: &[String]) -> bool {
        role.as_ref().is_some_and(|r| applied.iter().any(|tag| *tag == r.id))
    }
}

fn role_id(role: &Option<TagRole>) -> Option<&str> {
    role.as_ref().map(|r| r.id.as_str())
}

fn role_emoji(role: &Option<TagRole>) -> String {
    match role.as_ref().and_then(|r| r.emoji.as_deref()) {
        Some(emoji) if !emoji.is_empty() => format!("{emoji} "),
        _ => String::new(),
    }
}
