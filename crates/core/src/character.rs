//! Character card domain type.
//!
//! Read-only input to the prompt builder. Fields follow the common card
//! layout: free-text description/personality/scenario, example dialogue,
//! an optional base-prompt override and post-history instructions, and an
//! optional embedded lorebook.

use serde::{Deserialize, Serialize};

use crate::lorebook::Lorebook;

/// A character ("persona the model plays").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Character {
    /// Display name, substituted for `{{char}}`.
    pub name: String,

    /// Who the character is.
    #[serde(default)]
    pub description: String,

    /// Personality summary.
    #[serde(default)]
    pub personality: String,

    /// Scenario framing.
    #[serde(default)]
    pub scenario: String,

    /// Example dialogue.
    #[serde(default)]
    pub mes_example: String,

    /// Greeting shown when a chat starts. Not read by the builder.
    #[serde(default)]
    pub first_mes: String,

    /// Alternate greetings ("greeting swipes"). Not read by the builder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_greetings: Vec<String>,

    /// Card-supplied base prompt. When the `base_prompt` slot allows
    /// override and this is non-empty, it replaces the configured base
    /// prompt (with `{{original}}` expanding to the configured text).
    #[serde(default)]
    pub system_prompt: String,

    /// Card-supplied jailbreak. Same override rule, applied to the
    /// `sub_prompt` slot.
    #[serde(default)]
    pub post_history_instructions: String,

    /// Embedded lorebook, if the card ships one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_book: Option<Lorebook>,
}

impl Character {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}
