use std::collections::HashSet;

use crate::vocabulary::{StatusAction, TagVocabulary};

/// Set equality over applied-tag snapshots; order is meaningless and
/// duplicates carry no weight.
pub fn same_tags(a: &[String], b: &[String]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let set: HashSet<&str> = a.iter().map(String::as_str).collect();
    b.iter().all(|tag| set.contains(tag.as_str()))
}

/// True iff `tag` is absent from `before` and present in `after`. An empty
/// tag id (unconfigured role) never matches.
pub fn tag_added(before: &[String], after: &[String], tag: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    !before.iter().any(|t| t == tag) && after.iter().any(|t| t == tag)
}

/// Scans the vocabulary's status tags in priority order and returns the
/// first one newly added between the two snapshots. A single edit can add
/// several status tags; only one notification should fire.
pub fn highest_priority_added_action(
    vocab: &TagVocabulary,
    before: &[String],
    after: &[String],
) -> Option<StatusAction> {
    vocab.status_pairs().into_iter().find_map(|(tag, action)| match tag {
        Some(id) if tag_added(before, after, id) => Some(action),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::{highest_priority_added_action, same_tags, tag_added};
    use crate::config::{TagRole, TagsConfig};
    use crate::vocabulary::{StatusAction, TagVocabulary};

    fn tags(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn status_vocabulary() -> TagVocabulary {
        let role = |id: &str| Some(TagRole { id: id.to_string(), emoji: None });
        TagVocabulary::new(TagsConfig {
            looking_for_players: role("lfp"),
            active: role("act"),
            inactive: role("inact"),
            temporarily_inactive: role("tmp"),
            ..TagsConfig::default()
        })
    }

    #[test]
    fn same_tags_is_order_independent_and_symmetric() {
        let a = tags(&["1", "2", "3"]);
        let b = tags(&["3", "1", "2"]);
        assert!(same_tags(&a, &b));
        assert!(same_tags(&b, &a));
        assert!(same_tags(&a, &a));
    }

    #[test]
    fn same_tags_detects_membership_difference() {
        assert!(!same_tags(&tags(&["1", "2"]), &tags(&["1", "3"])));
        assert!(!same_tags(&tags(&["1"]), &tags(&["1", "2"])));
        assert!(same_tags(&tags(&[]), &tags(&[])));
    }

    #[test]
    fn tag_added_requires_absent_before_and_present_after() {
        assert!(tag_added(&tags(&[]), &tags(&["x"]), "x"));
        assert!(!tag_added(&tags(&["x"]), &tags(&["x"]), "x"));
        assert!(!tag_added(&tags(&[]), &tags(&[]), "x"));
        assert!(!tag_added(&tags(&["x"]), &tags(&[]), "x"));
    }

    #[test]
    fn empty_tag_id_never_counts_as_added() {
        assert!(!tag_added(&tags(&[]), &tags(&["", "x"]), ""));
    }

    #[test]
    fn looking_for_players_wins_priority_ties() {
        let vocab = status_vocabulary();
        let action = highest_priority_added_action(&vocab, &tags(&[]), &tags(&["lfp", "act"]));
        assert_eq!(action, Some(StatusAction::LookingForPlayers));
    }

    #[test]
    fn lower_priority_actions_resolve_when_alone() {
        let vocab = status_vocabulary();
        assert_eq!(
            highest_priority_added_action(&vocab, &tags(&["lfp"]), &tags(&["lfp", "inact"])),
            Some(StatusAction::Inactive)
        );
        assert_eq!(
            highest_priority_added_action(&vocab, &tags(&[]), &tags(&["tmp"])),
            Some(StatusAction::TemporarilyInactive)
        );
    }

    #[test]
    fn no_status_tag_added_resolves_to_none() {
        let vocab = status_vocabulary();
        assert_eq!(highest_priority_added_action(&vocab, &tags(&["act"]), &tags(&["act"])), None);
        assert_eq!(highest_priority_added_action(&vocab, &tags(&["act"]), &tags(&[])), None);
    }
}
