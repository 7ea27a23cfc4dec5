//! Vendor-neutral prompt types.
//!
//! [`PromptEntry`] is the unit the builder produces and every adapter
//! consumes. The ordering of a `Vec<PromptEntry>` *is* the conversation
//! order: adapters may merge or rename entries predictably, never reorder
//! them silently.

use serde::{Deserialize, Serialize};

/// The role of a prompt entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One role-tagged unit of the assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    pub role: PromptRole,
    pub content: String,

    /// Marks a prefill entry: a synthetic trailing assistant turn the model
    /// is expected to continue rather than answer.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prefix: bool,
}

impl PromptEntry {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
            prefix: false,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
            prefix: false,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: content.into(),
            prefix: false,
        }
    }
}

/// The closed set of prompt-configuration slot kinds.
///
/// User-edited configuration stores keys as strings; unknown strings are
/// dropped during normalization instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKey {
    BasePrompt,
    Description,
    Personality,
    Scenario,
    MesExample,
    Persona,
    WorldInfo,
    CharacterBook,
    Messages,
    SubPrompt,
    ContinuePrompt,
    PrefillPrompt,
    Custom,
}

impl SlotKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BasePrompt => "base_prompt",
            Self::Description => "description",
            Self::Personality => "personality",
            Self::Scenario => "scenario",
            Self::MesExample => "mes_example",
            Self::Persona => "persona",
            Self::WorldInfo => "world_info",
            Self::CharacterBook => "character_book",
            Self::Messages => "messages",
            Self::SubPrompt => "sub_prompt",
            Self::ContinuePrompt => "continue_prompt",
            Self::PrefillPrompt => "prefill_prompt",
            Self::Custom => "custom",
        }
    }

    /// Parse a user-supplied key string. `None` for unknown keys.
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "base_prompt" => Some(Self::BasePrompt),
            "description" => Some(Self::Description),
            "personality" => Some(Self::Personality),
            "scenario" => Some(Self::Scenario),
            "mes_example" => Some(Self::MesExample),
            "persona" => Some(Self::Persona),
            "world_info" => Some(Self::WorldInfo),
            "character_book" => Some(Self::CharacterBook),
            "messages" => Some(Self::Messages),
            "sub_prompt" => Some(Self::SubPrompt),
            "continue_prompt" => Some(Self::ContinuePrompt),
            "prefill_prompt" => Some(Self::PrefillPrompt),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A user-editable, ordered prompt-configuration slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfigEntry {
    /// Slot key as stored in settings. Unknown keys are dropped during
    /// normalization, not rejected.
    pub key: String,

    /// Whether the slot participates. Advisory only for `custom` and
    /// `messages` (see the builder).
    #[serde(default)]
    pub enabled: bool,

    /// User-supplied slot text, where the slot carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Role override for slots that allow one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<PromptRole>,

    /// Whether a character-card field may override this slot's content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_override: Option<bool>,
}

impl PromptConfigEntry {
    pub fn new(key: SlotKey) -> Self {
        Self {
            key: key.as_str().to_string(),
            enabled: true,
            content: None,
            role: None,
            allow_override: None,
        }
    }

    pub fn with_content(key: SlotKey, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(key)
        }
    }

    /// The parsed slot kind, `None` for unknown keys.
    pub fn slot(&self) -> Option<SlotKey> {
        SlotKey::parse(&self.key)
    }

    /// The configured content, empty string if unset.
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}
