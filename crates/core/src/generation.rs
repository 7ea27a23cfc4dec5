//! Per-request generation aggregate.
//!
//! A [`GenerationRequest`] bundles everything one generation call needs:
//! character, chat, user identity, sampling settings, the ordered prompt
//! configuration and the resolved global lorebooks. Built fresh per request,
//! never persisted.

use serde::{Deserialize, Serialize};

use crate::character::Character;
use crate::chat::Chat;
use crate::lorebook::Lorebook;
use crate::macros::Names;
use crate::prompt::PromptConfigEntry;

/// Sampling and wire settings for one call.
///
/// Every numeric/string field is optional: adapters fall back to their own
/// `API_SETTINGS` defaults rather than failing the call when a key is
/// missing or was never configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Which adapter to route to ("openai", "anthropic", "google", ...).
    #[serde(default)]
    pub api_mode: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Prompt-side token budget for history truncation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_size: Option<usize>,

    /// Raw stop strings; adapters macro-substitute and drop empties before
    /// putting them on the wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,

    /// Whether to request an SSE stream.
    #[serde(default)]
    pub stream: bool,

    // --- Vendor-specific extras, ignored by adapters that lack them ---
    /// Reasoning effort for models that expose it (OpenAI o-series, xAI).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,

    /// Mistral moderation flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_prompt: Option<bool>,

    /// Mistral deterministic sampling seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,

    /// Z.AI thinking toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,

    /// Anthropic prompt caching toggle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_caching: Option<bool>,
}

/// Everything one generation call consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub character: Character,
    pub chat: Chat,

    /// The user's display name, substituted for `{{user}}`.
    #[serde(default)]
    pub user_name: String,

    /// The user persona block for the `persona` slot. May be empty.
    #[serde(default)]
    pub persona: String,

    pub settings: GenerationSettings,

    /// The ordered, user-editable prompt configuration.
    #[serde(default)]
    pub prompt_config: Vec<PromptConfigEntry>,

    /// Globally enabled lorebooks, already loaded from storage.
    #[serde(default)]
    pub lorebooks: Vec<Lorebook>,

    /// True when regenerating the last turn as a new swipe; the message
    /// being replaced must not be part of its own prompt.
    #[serde(default)]
    pub swipe: bool,
}

impl GenerationRequest {
    /// History offset: a swipe excludes the very last message.
    pub fn offset(&self) -> usize {
        if self.swipe { 1 } else { 0 }
    }

    /// The substitution names for this request.
    pub fn names(&self) -> Names<'_> {
        Names::new(&self.user_name, &self.character.name)
    }
}
