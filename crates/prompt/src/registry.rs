//! Prompt slot registry.
//!
//! The fixed set of configuration slots, their per-key metadata, and the
//! normalization pass the builder runs on every read: missing keys are
//! injected with defaults, unknown keys dropped, duplicates collapsed
//! (except `custom`, which may repeat), and `locked_after` ordering
//! constraints repaired.

use loreweave_core::prompt::{PromptConfigEntry, SlotKey};
use tracing::debug;

/// Per-key metadata for one slot kind.
#[derive(Debug, Clone, Copy)]
pub struct SlotMeta {
    pub key: SlotKey,
    /// Whether the user may disable the slot.
    pub toggleable: bool,
    /// Whether the slot carries user-editable content.
    pub editable: bool,
    /// Whether a character-card field may override the slot's content.
    pub overridable: bool,
    /// When set, the slot is pinned immediately after the named key.
    pub locked_after: Option<SlotKey>,
    /// Enabled state for an injected default.
    pub default_enabled: bool,
}

/// The registry, in default slot order.
pub const REGISTRY: &[SlotMeta] = &[
    SlotMeta {
        key: SlotKey::BasePrompt,
        toggleable: true,
        editable: true,
        overridable: true,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::Description,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::Personality,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::Scenario,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::MesExample,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::Persona,
        toggleable: true,
        editable: false,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::WorldInfo,
        toggleable: true,
        editable: false,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::CharacterBook,
        toggleable: true,
        editable: false,
        overridable: false,
        locked_after: Some(SlotKey::WorldInfo),
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::Messages,
        toggleable: false,
        editable: false,
        overridable: false,
        locked_after: None,
        default_enabled: true,
    },
    SlotMeta {
        key: SlotKey::SubPrompt,
        toggleable: true,
        editable: true,
        overridable: true,
        locked_after: Some(SlotKey::Messages),
        default_enabled: false,
    },
    SlotMeta {
        key: SlotKey::ContinuePrompt,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: Some(SlotKey::SubPrompt),
        default_enabled: false,
    },
    SlotMeta {
        key: SlotKey::PrefillPrompt,
        toggleable: true,
        editable: true,
        overridable: false,
        locked_after: Some(SlotKey::ContinuePrompt),
        default_enabled: false,
    },
    // `custom` is user-added and may repeat; it is never injected.
];

/// Look up a slot's metadata.
pub fn meta(key: SlotKey) -> Option<&'static SlotMeta> {
    REGISTRY.iter().find(|m| m.key == key)
}

/// The default configuration list.
pub fn defaults() -> Vec<PromptConfigEntry> {
    REGISTRY
        .iter()
        .map(|m| PromptConfigEntry {
            enabled: m.default_enabled,
            ..PromptConfigEntry::new(m.key)
        })
        .collect()
}

/// Validate and repair a user-edited configuration list.
///
/// Invariants of the output: every registry key appears exactly once,
/// `custom` entries survive as-is (and may repeat), unknown keys are gone,
/// and `locked_after` keys sit immediately after their anchors. The user's
/// relative ordering is otherwise preserved.
pub fn normalize(config: &[PromptConfigEntry]) -> Vec<PromptConfigEntry> {
    let mut out: Vec<PromptConfigEntry> = Vec::with_capacity(config.len());
    let mut seen: Vec<SlotKey> = Vec::new();

    for entry in config {
        match entry.slot() {
            None => {
                debug!(key = %entry.key, "Dropping unknown prompt slot");
            }
            Some(SlotKey::Custom) => out.push(entry.clone()),
            Some(key) => {
                if seen.contains(&key) {
                    debug!(key = %entry.key, "Collapsing duplicate prompt slot");
                } else {
                    seen.push(key);
                    out.push(entry.clone());
                }
            }
        }
    }

    // Inject missing registry keys with defaults.
    for m in REGISTRY {
        if !seen.contains(&m.key) {
            out.push(PromptConfigEntry {
                enabled: m.default_enabled,
                ..PromptConfigEntry::new(m.key)
            });
        }
    }

    // Repair `locked_after` ordering: move each locked key directly behind
    // its anchor. Registry order makes chained locks settle in one pass.
    for m in REGISTRY {
        let Some(anchor) = m.locked_after else {
            continue;
        };
        let Some(from) = out
            .iter()
            .position(|e| e.slot() == Some(m.key))
        else {
            continue;
        };
        let entry = out.remove(from);
        let Some(anchor_at) = out.iter().position(|e| e.slot() == Some(anchor)) else {
            out.insert(from, entry);
            continue;
        };
        out.insert(anchor_at + 1, entry);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(config: &[PromptConfigEntry]) -> Vec<&str> {
        config.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn defaults_cover_registry() {
        let config = defaults();
        assert_eq!(config.len(), REGISTRY.len());
        assert_eq!(config[0].key, "base_prompt");
        assert!(config.iter().any(|e| e.key == "messages" && e.enabled));
    }

    #[test]
    fn unknown_keys_dropped() {
        let config = vec![
            PromptConfigEntry::new(SlotKey::BasePrompt),
            PromptConfigEntry {
                key: "mystery_slot".into(),
                enabled: true,
                content: None,
                role: None,
                allow_override: None,
            },
        ];
        let normalized = normalize(&config);
        assert!(!keys(&normalized).contains(&"mystery_slot"));
    }

    #[test]
    fn missing_keys_injected() {
        let normalized = normalize(&[PromptConfigEntry::new(SlotKey::BasePrompt)]);
        for m in REGISTRY {
            assert!(
                normalized.iter().any(|e| e.slot() == Some(m.key)),
                "missing {:?}",
                m.key
            );
        }
    }

    #[test]
    fn duplicates_collapsed_keeping_first() {
        let mut first = PromptConfigEntry::new(SlotKey::BasePrompt);
        first.content = Some("first".into());
        let mut second = PromptConfigEntry::new(SlotKey::BasePrompt);
        second.content = Some("second".into());

        let normalized = normalize(&[first, second]);
        let base: Vec<_> = normalized
            .iter()
            .filter(|e| e.slot() == Some(SlotKey::BasePrompt))
            .collect();
        assert_eq!(base.len(), 1);
        assert_eq!(base[0].content_str(), "first");
    }

    #[test]
    fn custom_may_repeat() {
        let config = vec![
            PromptConfigEntry::with_content(SlotKey::Custom, "one"),
            PromptConfigEntry::with_content(SlotKey::Custom, "two"),
        ];
        let normalized = normalize(&config);
        let customs: Vec<_> = normalized
            .iter()
            .filter(|e| e.slot() == Some(SlotKey::Custom))
            .collect();
        assert_eq!(customs.len(), 2);
    }

    #[test]
    fn locked_keys_follow_their_anchors() {
        // Scramble the locked keys to the front.
        let config = vec![
            PromptConfigEntry::new(SlotKey::SubPrompt),
            PromptConfigEntry::new(SlotKey::PrefillPrompt),
            PromptConfigEntry::new(SlotKey::Messages),
            PromptConfigEntry::new(SlotKey::BasePrompt),
        ];
        let normalized = normalize(&config);
        let ks = keys(&normalized);
        let at = |k: &str| ks.iter().position(|x| *x == k).unwrap();

        assert_eq!(at("sub_prompt"), at("messages") + 1);
        assert_eq!(at("continue_prompt"), at("sub_prompt") + 1);
        assert_eq!(at("prefill_prompt"), at("continue_prompt") + 1);
        assert_eq!(at("character_book"), at("world_info") + 1);
    }

    #[test]
    fn user_relative_order_preserved() {
        let config = vec![
            PromptConfigEntry::new(SlotKey::Scenario),
            PromptConfigEntry::new(SlotKey::Description),
            PromptConfigEntry::new(SlotKey::BasePrompt),
        ];
        let normalized = normalize(&config);
        let ks = keys(&normalized);
        let at = |k: &str| ks.iter().position(|x| *x == k).unwrap();
        assert!(at("scenario") < at("description"));
        assert!(at("description") < at("base_prompt"));
    }
}
