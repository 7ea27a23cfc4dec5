//! Lorebook entry selection.
//!
//! Given a chat's recent messages and a lorebook, decides which entries
//! trigger and trims them to the book's token budget. Trigger, trim and
//! final ordering are three separate contracts:
//!
//! 1. entries trigger independent of final ordering,
//! 2. the budget keeps entries in descending `priority` order, greedily —
//!    priority order is the tie-break contract, not total value
//!    maximization,
//! 3. survivors are re-sorted by ascending `insertion_order` before
//!    concatenation.

use loreweave_core::chat::Chat;
use loreweave_core::lorebook::{Lorebook, LorebookEntry};
use loreweave_core::macros::{Names, substitute};
use tracing::trace;

/// A triggered entry that survived the budget, with macros already expanded.
#[derive(Debug, Clone)]
pub struct SelectedEntry<'a> {
    pub entry: &'a LorebookEntry,
    pub content: String,
}

/// Select the lorebook entries to inject for this chat.
///
/// `counter` is the tokenizer adapter for the active model; the summed cost
/// of the returned entries never exceeds `book.token_budget`.
pub fn select_entries<'a>(
    book: &'a Lorebook,
    chat: &Chat,
    names: Names<'_>,
    counter: &dyn Fn(&str) -> usize,
) -> Vec<SelectedEntry<'a>> {
    let window = chat.recent_texts(book.scan_depth).join("\n");

    let mut triggered: Vec<SelectedEntry<'a>> = book
        .entries
        .iter()
        .filter(|e| e.enabled && !e.content.is_empty())
        .filter(|e| triggers(e, &window))
        .map(|e| SelectedEntry {
            entry: e,
            content: substitute(&e.content, names),
        })
        .collect();

    // Budget pass: descending priority, greedy, stop at the first entry
    // that would overflow.
    triggered.sort_by(|a, b| b.entry.priority.cmp(&a.entry.priority));
    let mut kept = Vec::with_capacity(triggered.len());
    let mut used = 0usize;
    for selected in triggered {
        let cost = counter(&selected.content);
        if used + cost > book.token_budget {
            trace!(
                book = %book.name,
                used,
                cost,
                budget = book.token_budget,
                "Lorebook budget reached, discarding remainder"
            );
            break;
        }
        used += cost;
        kept.push(selected);
    }

    // Final ordering pass.
    kept.sort_by_key(|s| s.entry.insertion_order);
    kept
}

/// Concatenate surviving entries into one system-role block.
pub fn render(selected: &[SelectedEntry<'_>]) -> Option<String> {
    if selected.is_empty() {
        return None;
    }
    Some(
        selected
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
    )
}

/// Whether an entry triggers against the scan window.
fn triggers(entry: &LorebookEntry, window: &str) -> bool {
    if entry.constant {
        return true;
    }
    if !any_key_matches(&entry.keys, window, entry.case_sensitive) {
        return false;
    }
    if entry.selective {
        return any_key_matches(&entry.secondary_keys, window, entry.case_sensitive);
    }
    true
}

fn any_key_matches(keys: &[String], window: &str, case_sensitive: bool) -> bool {
    // An empty key would substring-match everything; it never matches.
    if case_sensitive {
        keys.iter().any(|k| !k.is_empty() && window.contains(k.as_str()))
    } else {
        let window = window.to_lowercase();
        keys.iter()
            .any(|k| !k.is_empty() && window.contains(&k.to_lowercase()))
    }
}
