//! Vendor shape transforms.
//!
//! The prompt builder's output is vendor-neutral; each adapter applies the
//! subset of these policies its vendor requires before serializing the wire
//! body. Transforms may merge or append entries, never reorder them.

use loreweave_core::macros::{Names, substitute};
use loreweave_core::prompt::{PromptEntry, PromptRole};

/// Synthetic turn content used by the termination and leading repairs.
pub const CONTINUE_TURN: &str = "(continue)";

/// Merge consecutive same-role entries into one, joined by `sep`.
///
/// Idempotent: squashing an already-squashed list returns it unchanged.
pub fn squash(entries: Vec<PromptEntry>, sep: &str) -> Vec<PromptEntry> {
    let mut out: Vec<PromptEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.last_mut() {
            Some(last) if last.role == entry.role => {
                last.content.push_str(sep);
                last.content.push_str(&entry.content);
                last.prefix = last.prefix || entry.prefix;
            }
            _ => out.push(entry),
        }
    }
    out
}

/// Pull system entries out of the list, concatenated for vendors that take
/// the system prompt as a top-level field.
pub fn extract_system(entries: Vec<PromptEntry>) -> (Option<String>, Vec<PromptEntry>) {
    let mut system_parts: Vec<String> = Vec::new();
    let mut rest: Vec<PromptEntry> = Vec::new();

    for entry in entries {
        if entry.role == PromptRole::System {
            system_parts.push(entry.content);
        } else {
            rest.push(entry);
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, rest)
}

/// Termination repair: vendors that require the sequence to end on a user
/// turn get a synthetic one appended. An empty list gets the same minimal
/// turn. A trailing prefill entry is left alone.
pub fn ensure_trailing_user(mut entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
    match entries.last() {
        Some(last) if last.role == PromptRole::User || last.prefix => {}
        _ => entries.push(PromptEntry::user(CONTINUE_TURN)),
    }
    entries
}

/// Leading-turn repair: vendors that reject an assistant-first sequence get
/// a synthetic opening user turn.
pub fn ensure_leading_user(mut entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
    if entries.first().is_some_and(|e| e.role == PromptRole::Assistant) {
        entries.insert(0, PromptEntry::user(CONTINUE_TURN));
    }
    entries
}

/// Macro-substitute each stop string and drop blank results.
pub fn sanitize_stop_sequences(stops: &[String], names: Names<'_>) -> Vec<String> {
    stops
        .iter()
        .map(|s| substitute(s, names))
        .filter(|s| !s.trim().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating() -> Vec<PromptEntry> {
        vec![
            PromptEntry::system("sys"),
            PromptEntry::user("one"),
            PromptEntry::assistant("two"),
            PromptEntry::user("three"),
        ]
    }

    #[test]
    fn squash_merges_adjacent_same_role() {
        let entries = vec![
            PromptEntry::system("a"),
            PromptEntry::system("b"),
            PromptEntry::user("c"),
            PromptEntry::user("d"),
            PromptEntry::assistant("e"),
        ];
        let squashed = squash(entries, "\n\n");
        assert_eq!(squashed.len(), 3);
        assert_eq!(squashed[0].content, "a\n\nb");
        assert_eq!(squashed[1].content, "c\n\nd");
        assert_eq!(squashed[2].content, "e");
    }

    #[test]
    fn squash_is_idempotent() {
        let once = squash(alternating(), "\n");
        let twice = squash(once.clone(), "\n");
        assert_eq!(once, twice);
    }

    #[test]
    fn extract_system_lifts_all_system_entries() {
        let (system, rest) = extract_system(vec![
            PromptEntry::system("base"),
            PromptEntry::user("hi"),
            PromptEntry::system("lore"),
        ]);
        assert_eq!(system.as_deref(), Some("base\n\nlore"));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].content, "hi");
    }

    #[test]
    fn trailing_repair_appends_user_turn() {
        let repaired = ensure_trailing_user(vec![PromptEntry::assistant("hello")]);
        assert_eq!(repaired.len(), 2);
        assert_eq!(repaired[1].role, PromptRole::User);
        assert_eq!(repaired[1].content, CONTINUE_TURN);
    }

    #[test]
    fn trailing_repair_on_empty_list_synthesizes_minimal_turn() {
        let repaired = ensure_trailing_user(Vec::new());
        assert_eq!(repaired.len(), 1);
        assert_eq!(repaired[0].content, CONTINUE_TURN);
    }

    #[test]
    fn trailing_repair_leaves_prefill_alone() {
        let mut prefill = PromptEntry::assistant("Certainly,");
        prefill.prefix = true;
        let repaired = ensure_trailing_user(vec![PromptEntry::user("hi"), prefill]);
        assert_eq!(repaired.len(), 2);
    }

    #[test]
    fn leading_repair_inserts_opening_user_turn() {
        let repaired = ensure_leading_user(vec![PromptEntry::assistant("hello")]);
        assert_eq!(repaired[0].role, PromptRole::User);
        assert_eq!(repaired[1].role, PromptRole::Assistant);

        let untouched = ensure_leading_user(vec![PromptEntry::user("hi")]);
        assert_eq!(untouched.len(), 1);
    }

    #[test]
    fn stop_sequences_substituted_and_filtered() {
        let names = Names::new("Alice", "Aria");
        let stops = vec!["{{user}}:".to_string(), "  ".to_string(), "###".to_string()];
        let sanitized = sanitize_stop_sequences(&stops, names);
        assert_eq!(sanitized, vec!["Alice:", "###"]);
    }
}
