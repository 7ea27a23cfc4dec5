//! DeepSeek adapter.
//!
//! `POST {base}/chat/completions` (no `/v1` segment), Bearer auth. OpenAI
//! wire dialect; the reasoner models interleave `reasoning_content` deltas
//! with `content` deltas, accumulated separately into
//! `candidate.reasoning`.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::SettingSchema;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::PromptEntry;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::{ensure_trailing_user, sanitize_stop_sequences, squash};
use crate::wire::ApiMessage;

const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "deepseek-chat"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 1.0, 0.0, 2.0),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 1.0, 0.0, 1.0),
        SettingSchema::number("frequency_penalty", "Frequency Penalty", "Penalize repeated tokens", 0.0, -2.0, 2.0),
        SettingSchema::number("presence_penalty", "Presence Penalty", "Penalize tokens already present", 0.0, -2.0, 2.0),
        SettingSchema::number("max_tokens", "Max Tokens", "Completion length cap", 1024.0, 1.0, 8192.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
    ]
});

/// The DeepSeek chat-completions adapter.
#[derive(Debug)]
pub struct DeepSeekAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl DeepSeekAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http_client(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Adapter for DeepSeekAdapter {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn settings_schema(&self) -> &'static [SettingSchema] {
        &API_SETTINGS
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint(&self, _request: &GenerationRequest, _stream: bool) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn transform(&self, entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
        ensure_trailing_user(squash(entries, "\n\n"))
    }

    fn build_body(&self, request: &GenerationRequest, offset: usize, stream: bool) -> serde_json::Value {
        let schema = self.settings_schema();
        let settings = &request.settings;
        let model = settings
            .model
            .clone()
            .unwrap_or_else(|| schema_str(schema, "model").to_string());

        let mut body = json!({
            "model": model,
            "messages": ApiMessage::from_entries(&self.make_prompt(request, offset)),
            "temperature": settings.temperature.map(f64::from).unwrap_or(schema_f64(schema, "temperature")),
            "top_p": settings.top_p.map(f64::from).unwrap_or(schema_f64(schema, "top_p")),
            "frequency_penalty": settings.frequency_penalty.map(f64::from).unwrap_or(schema_f64(schema, "frequency_penalty")),
            "presence_penalty": settings.presence_penalty.map(f64::from).unwrap_or(schema_f64(schema, "presence_penalty")),
            "max_tokens": settings.max_tokens.unwrap_or(schema_f64(schema, "max_tokens") as u32),
            "stream": stream,
        });

        let stops = sanitize_stop_sequences(&settings.stop_sequences, request.names());
        if !stops.is_empty() {
            body["stop"] = json!(stops);
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_core::chat::{Chat, ChatMessage};
    use loreweave_core::character::Character;
    use loreweave_core::generation::GenerationSettings;
    use loreweave_core::prompt::{PromptConfigEntry, SlotKey};
    use crate::sse::StreamState;

    fn request() -> GenerationRequest {
        let mut chat = Chat::new();
        chat.push(ChatMessage::user("Hi"));
        GenerationRequest {
            character: Character::new("Aria"),
            chat,
            user_name: "Alice".into(),
            persona: String::new(),
            settings: GenerationSettings::default(),
            prompt_config: vec![PromptConfigEntry::new(SlotKey::Messages)],
            lorebooks: Vec::new(),
            swipe: false,
        }
    }

    #[test]
    fn endpoint_has_no_version_segment() {
        let adapter = DeepSeekAdapter::new("key");
        assert_eq!(
            adapter.endpoint(&request(), true),
            "https://api.deepseek.com/chat/completions"
        );
    }

    #[test]
    fn reasoning_deltas_accumulate_separately() {
        let adapter = DeepSeekAdapter::new("key");
        let mut state = StreamState::new();
        let mut reply = adapter.create_reply(None, None);

        let chunk = "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"First, \"},\"finish_reason\":null}]}\n\n\
                     data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"consider.\"},\"finish_reason\":null}]}\n\n\
                     data: {\"choices\":[{\"delta\":{\"content\":\"Hello.\"},\"finish_reason\":null}]}\n\n";
        assert!(adapter.receive_stream(chunk, &mut state, &mut reply).is_none());
        assert_eq!(reply.candidate.reasoning.as_deref(), Some("First, consider."));
        assert_eq!(reply.candidate.text, "Hello.");
    }
}
