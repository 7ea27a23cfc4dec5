//! Chat, message and candidate domain types.
//!
//! A chat is an ordered sequence of messages. Each message holds one or more
//! candidates ("swipes") and a selector index pointing at the active one;
//! only the active candidate's text ever participates in prompt building.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One generated (or typed) variant of a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The text content.
    pub text: String,

    /// Model-emitted reasoning, if the vendor exposed any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Which model produced this candidate, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// When the candidate was produced.
    pub timestamp: DateTime<Utc>,
}

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reasoning: None,
            model: None,
            timestamp: Utc::now(),
        }
    }
}

/// A single message slot in a chat.
///
/// `participant > -1` means the message belongs to a character (assistant
/// side); `-1` means it is the user's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID.
    pub id: String,

    /// Character index for assistant messages, `-1` for the user.
    pub participant: i64,

    /// All candidates ("swipes") for this slot. Never empty.
    pub candidates: Vec<Candidate>,

    /// Which candidate is active.
    #[serde(default)]
    pub index: usize,

    /// Timestamp of the slot itself.
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a user message with a single candidate.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            participant: -1,
            candidates: vec![Candidate::new(text)],
            index: 0,
            timestamp: Utc::now(),
        }
    }

    /// Create a character message with a single candidate.
    pub fn character(participant: i64, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            participant,
            candidates: vec![Candidate::new(text)],
            index: 0,
            timestamp: Utc::now(),
        }
    }

    /// Whether this is an assistant-side message.
    pub fn is_assistant(&self) -> bool {
        self.participant > -1
    }

    /// The active candidate's text. Falls back to the first candidate if the
    /// selector index is out of range (tolerates malformed persisted chats).
    pub fn active_text(&self) -> &str {
        self.candidates
            .get(self.index)
            .or_else(|| self.candidates.first())
            .map(|c| c.text.as_str())
            .unwrap_or("")
    }
}

/// A chat: an ordered sequence of message slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    /// Unique chat ID.
    pub id: String,

    /// Ordered message slots.
    pub messages: Vec<ChatMessage>,

    /// When this chat was created.
    pub created_at: DateTime<Utc>,

    /// When the last message was added.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new empty chat.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a message slot to the chat.
    pub fn push(&mut self, message: ChatMessage) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// The active texts of the last `depth` messages, newest last.
    /// This is the scan window the lorebook selector reads.
    pub fn recent_texts(&self, depth: usize) -> Vec<&str> {
        let start = self.messages.len().saturating_sub(depth);
        self.messages[start..].iter().map(|m| m.active_text()).collect()
    }
}

impl Default for Chat {
    fn default() -> Self {
        Self::new()
    }
}
