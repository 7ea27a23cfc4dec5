//! The canonical reply/error envelope.
//!
//! Every provider adapter produces exactly this shape, whatever the vendor
//! payload looked like. Streaming emits a sequence of partial [`Reply`]
//! values (`done == false`) followed by one terminal value; errors — vendor
//! reported or transport — become an [`ErrorEnvelope`] on the same wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// The candidate being built up by a generation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyCandidate {
    #[serde(default)]
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A canonical (possibly partial) reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Whether the generation is finished.
    pub done: bool,

    /// Which character replied.
    pub participant: i64,

    /// Set when this reply is a new swipe for an existing message slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swipe: Option<bool>,

    /// Set when this reply replaces the active candidate in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace: Option<bool>,

    pub candidate: ReplyCandidate,
}

impl Reply {
    /// A fresh, empty envelope — `done == false`, empty candidate. Every
    /// adapter starts from this so all vendors return a structurally
    /// identical object.
    pub fn new(participant: i64, swipe: Option<bool>, replace: Option<bool>) -> Self {
        Self {
            done: false,
            participant,
            swipe,
            replace,
            candidate: ReplyCandidate {
                timestamp: Some(Utc::now()),
                ..Default::default()
            },
        }
    }

    /// Append an incremental text delta.
    pub fn push_text(&mut self, delta: &str) {
        self.candidate.text.push_str(delta);
    }

    /// Append an incremental reasoning delta.
    pub fn push_reasoning(&mut self, delta: &str) {
        self.candidate
            .reasoning
            .get_or_insert_with(String::new)
            .push_str(delta);
    }

    /// Record which model produced the reply.
    pub fn set_model(&mut self, model: &str) {
        if !model.is_empty() {
            self.candidate.model = Some(model.to_string());
        }
    }
}

/// The canonical error body. Vendor-reported type/message are preserved
/// where present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub message: String,
}

/// The canonical error envelope: `{"error": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl ErrorEnvelope {
    /// An error as the vendor reported it.
    pub fn vendor(kind: Option<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind,
                message: message.into(),
            },
        }
    }
}

impl From<&ProviderError> for ErrorEnvelope {
    fn from(err: &ProviderError) -> Self {
        Self {
            error: ErrorBody {
                kind: Some(err.kind().to_string()),
                message: err.to_string(),
            },
        }
    }
}

/// What a generation call hands back to the orchestrator: either a reply or
/// an error, both serializing to their own canonical JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Reply(Reply),
    Error(ErrorEnvelope),
}

impl Outcome {
    /// Serialize as one newline-terminated JSON line. The orchestrator's
    /// streaming wire is newline-delimited so a transport that coalesces
    /// chunks can still be demultiplexed by the receiver.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| {
            // Serialization of these plain structs cannot realistically
            // fail, but the wire must never be left without a terminator.
            r#"{"error":{"message":"serialization failure"}}"#.to_string()
        });
        line.push('\n');
        line
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Reply(reply) => reply.done,
            Self::Error(_) => true,
        }
    }
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

impl From<ErrorEnvelope> for Outcome {
    fn from(err: ErrorEnvelope) -> Self {
        Self::Error(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reply_is_empty_and_not_done() {
        let reply = Reply::new(0, None, None);
        assert!(!reply.done);
        assert!(reply.candidate.text.is_empty());
        assert!(reply.candidate.reasoning.is_none());
        assert!(reply.candidate.timestamp.is_some());
    }

    #[test]
    fn deltas_accumulate() {
        let mut reply = Reply::new(0, Some(true), None);
        reply.push_text("Hel");
        reply.push_text("lo");
        reply.push_reasoning("because");
        assert_eq!(reply.candidate.text, "Hello");
        assert_eq!(reply.candidate.reasoning.as_deref(), Some("because"));
    }

    #[test]
    fn vendor_error_keeps_type() {
        let env = ErrorEnvelope::vendor(Some("invalid_request_error".into()), "bad model");
        let json = serde_json::to_string(&env).unwrap();
        assert!(json.contains("\"type\":\"invalid_request_error\""));
        assert!(json.contains("bad model"));
    }

    #[test]
    fn transport_error_reshaped() {
        let err = ProviderError::Network("connection refused".into());
        let env = ErrorEnvelope::from(&err);
        assert_eq!(env.error.kind.as_deref(), Some("network"));
        assert!(env.error.message.contains("connection refused"));
    }

    #[test]
    fn outcome_line_is_newline_terminated() {
        let line = Outcome::from(Reply::new(0, None, None)).to_line();
        assert!(line.ends_with('\n'));
        assert!(!line[..line.len() - 1].contains('\n'));
    }

    #[test]
    fn terminal_detection() {
        let mut reply = Reply::new(0, None, None);
        assert!(!Outcome::from(reply.clone()).is_terminal());
        reply.done = true;
        assert!(Outcome::from(reply).is_terminal());
        assert!(Outcome::from(ErrorEnvelope::vendor(None, "boom")).is_terminal());
    }

    #[test]
    fn swipe_flag_omitted_when_none() {
        let json = serde_json::to_string(&Reply::new(0, None, None)).unwrap();
        assert!(!json.contains("swipe"));
        assert!(!json.contains("replace"));
    }
}
