//! Shared OpenAI-compatible wire types.
//!
//! Five of the seven vendors speak the `/chat/completions` dialect; the
//! request/response shapes live here once. `reasoning_content` is the
//! DeepSeek-originated extension xAI and Z.AI also emit.

use loreweave_core::prompt::PromptEntry;
use loreweave_core::reply::{ErrorEnvelope, Reply};
use serde::{Deserialize, Serialize};

/// One message of a chat-completions request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiMessage {
    pub role: String,
    pub content: String,
}

impl ApiMessage {
    pub fn from_entries(entries: &[PromptEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|e| Self {
                role: e.role.as_str().to_string(),
                content: e.content.clone(),
            })
            .collect()
    }
}

/// A complete (non-streaming) chat-completions response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ApiChoice {
    pub message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ApiChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// A single SSE `data: {...}` chunk of a streaming response.
#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// The `{"error": {...}}` field most vendors put on failures.
#[derive(Debug, Deserialize)]
struct VendorError {
    error: VendorErrorBody,
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    #[serde(default)]
    r#type: Option<String>,
    #[serde(default)]
    message: Option<String>,
    /// Google reports `status` instead of `type`.
    #[serde(default)]
    status: Option<String>,
}

/// Re-shape a vendor error field into the canonical envelope, if present.
pub fn extract_error(value: &serde_json::Value) -> Option<ErrorEnvelope> {
    let vendor: VendorError = serde_json::from_value(value.clone()).ok()?;
    let kind = vendor.error.r#type.or(vendor.error.status);
    let message = vendor.error.message.unwrap_or_else(|| "Unknown provider error".to_string());
    Some(ErrorEnvelope::vendor(kind, message))
}

/// Fold one complete chat-completions payload into the reply.
pub fn extract_message(value: &serde_json::Value, reply: &mut Reply) {
    let Ok(response) = serde_json::from_value::<ApiResponse>(value.clone()) else {
        return;
    };
    if let Some(model) = &response.model {
        reply.set_model(model);
    }
    if let Some(choice) = response.choices.first() {
        if let Some(text) = &choice.message.content {
            reply.push_text(text);
        }
        if let Some(reasoning) = &choice.message.reasoning_content {
            reply.push_reasoning(reasoning);
        }
    }
}

/// Fold one streaming delta into the reply. Returns true when the chunk
/// carries a finish reason.
pub fn extract_delta(value: &serde_json::Value, reply: &mut Reply) -> bool {
    let Ok(chunk) = serde_json::from_value::<StreamResponse>(value.clone()) else {
        return false;
    };
    if let Some(model) = &chunk.model {
        reply.set_model(model);
    }
    let Some(choice) = chunk.choices.first() else {
        return false;
    };
    if let Some(text) = &choice.delta.content {
        reply.push_text(text);
    }
    if let Some(reasoning) = &choice.delta.reasoning_content {
        reply.push_reasoning(reasoning);
    }
    choice.finish_reason.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_reshaped() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{"error":{"message":"model not found","type":"invalid_request_error"}}"#,
        )
        .unwrap();
        let env = extract_error(&value).unwrap();
        assert_eq!(env.error.kind.as_deref(), Some("invalid_request_error"));
        assert_eq!(env.error.message, "model not found");
    }

    #[test]
    fn no_error_field_means_none() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(extract_error(&value).is_none());
    }

    #[test]
    fn complete_payload_extraction() {
        let value: serde_json::Value = serde_json::from_str(
            r#"{"model":"gpt-4o","choices":[{"message":{"content":"Hello!","role":"assistant"}}]}"#,
        )
        .unwrap();
        let mut reply = Reply::new(0, None, None);
        extract_message(&value, &mut reply);
        assert_eq!(reply.candidate.text, "Hello!");
        assert_eq!(reply.candidate.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn delta_accumulates_and_detects_finish() {
        let mut reply = Reply::new(0, None, None);
        let chunk: serde_json::Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert!(!extract_delta(&chunk, &mut reply));

        let last: serde_json::Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"lo"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert!(extract_delta(&last, &mut reply));
        assert_eq!(reply.candidate.text, "Hello");
    }

    #[test]
    fn reasoning_deltas_kept_separate() {
        let mut reply = Reply::new(0, None, None);
        let chunk: serde_json::Value = serde_json::from_str(
            r#"{"choices":[{"delta":{"reasoning_content":"thinking..."},"finish_reason":null}]}"#,
        )
        .unwrap();
        extract_delta(&chunk, &mut reply);
        assert!(reply.candidate.text.is_empty());
        assert_eq!(reply.candidate.reasoning.as_deref(), Some("thinking..."));
    }
}
