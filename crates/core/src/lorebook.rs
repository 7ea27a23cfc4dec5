//! Lorebook domain types.
//!
//! A lorebook is a keyed knowledge base of text snippets. Entries are
//! conditionally injected into the prompt when their trigger keys appear in
//! the recent chat window; selection and budget trimming live in the
//! `prompt` crate.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_scan_depth() -> usize {
    4
}

fn default_token_budget() -> usize {
    512
}

/// One conditionally injected snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LorebookEntry {
    /// Primary trigger keys. An empty list never triggers unless `constant`.
    #[serde(default)]
    pub keys: Vec<String>,

    /// Secondary keys; consulted only when `selective` is set.
    #[serde(default)]
    pub secondary_keys: Vec<String>,

    /// The text injected when the entry triggers. Empty content is skipped
    /// entirely, even when otherwise triggered.
    #[serde(default)]
    pub content: String,

    /// Always triggers, regardless of the scan window.
    #[serde(default)]
    pub constant: bool,

    /// Requires at least one secondary key match in addition to a primary.
    #[serde(default)]
    pub selective: bool,

    /// Whether key matching is case sensitive.
    #[serde(default)]
    pub case_sensitive: bool,

    /// Survival order under budget pressure: higher survives longer.
    #[serde(default)]
    pub priority: i64,

    /// Final ordering of surviving entries, ascending.
    #[serde(default)]
    pub insertion_order: i64,

    /// Disabled entries never trigger.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl LorebookEntry {
    /// Convenience constructor for a keyed entry.
    pub fn keyed(keys: &[&str], content: impl Into<String>) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            secondary_keys: Vec::new(),
            content: content.into(),
            constant: false,
            selective: false,
            case_sensitive: false,
            priority: 0,
            insertion_order: 0,
            enabled: true,
        }
    }

    /// Convenience constructor for an always-on entry.
    pub fn constant(content: impl Into<String>) -> Self {
        Self {
            constant: true,
            ..Self::keyed(&[], content)
        }
    }
}

/// A named collection of entries with its own scan and budget settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lorebook {
    pub name: String,

    /// Globally enabled books participate in the `world_info` slot.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// How many recent messages to scan for trigger keys.
    /// `0` disables scanning for non-constant entries.
    #[serde(default = "default_scan_depth")]
    pub scan_depth: usize,

    /// Token budget for this book's surviving entries.
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,

    #[serde(default)]
    pub entries: Vec<LorebookEntry>,
}

impl Lorebook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            scan_depth: default_scan_depth(),
            token_budget: default_token_budget(),
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_defaults() {
        let entry: LorebookEntry = serde_json::from_str(r#"{"keys": ["sword"]}"#).unwrap();
        assert!(entry.enabled);
        assert!(!entry.constant);
        assert!(!entry.selective);
        assert_eq!(entry.priority, 0);
    }

    #[test]
    fn book_defaults() {
        let book: Lorebook = serde_json::from_str(r#"{"name": "world"}"#).unwrap();
        assert!(book.enabled);
        assert_eq!(book.scan_depth, 4);
        assert_eq!(book.token_budget, 512);
        assert!(book.entries.is_empty());
    }
}
