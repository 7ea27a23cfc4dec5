//! Mistral adapter.
//!
//! `POST {base}/v1/chat/completions`, Bearer auth. Mistral enforces strict
//! role alternation and requires the sequence to end on a user turn, so the
//! prompt gets squashed and termination-repaired. Vendor extras:
//! `safe_prompt` moderation and a deterministic `random_seed`.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::SettingSchema;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::PromptEntry;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::{ensure_trailing_user, sanitize_stop_sequences, squash};
use crate::wire::ApiMessage;

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "mistral-large-latest"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 0.7, 0.0, 1.5),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 1.0, 0.0, 1.0),
        SettingSchema::number("max_tokens", "Max Tokens", "Completion length cap", 1024.0, 1.0, 128_000.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
        SettingSchema::toggle("safe_prompt", "Safe Prompt", "Prepend Mistral's moderation prompt", false),
    ]
});

/// The Mistral chat-completions adapter.
#[derive(Debug)]
pub struct MistralAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl MistralAdapter {
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
impl Adapter for MistralAdapter {
    fn name(&self) -> &'static str {
        "mistral"
    }

    fn settings_schema(&self) -> &'static [SettingSchema] {
        &API_SETTINGS
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint(&self, _request: &GenerationRequest, _stream: bool) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
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
            "max_tokens": settings.max_tokens.unwrap_or(schema_f64(schema, "max_tokens") as u32),
            "stream": stream,
            "safe_prompt": settings.safe_prompt.unwrap_or(false),
        });

        let stops = sanitize_stop_sequences(&settings.stop_sequences, request.names());
        if !stops.is_empty() {
            body["stop"] = json!(stops);
        }

        if let Some(seed) = settings.random_seed {
            body["random_seed"] = json!(seed);
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

    fn request() -> GenerationRequest {
        let mut chat = Chat::new();
        chat.push(ChatMessage::user("Hi"));
        chat.push(ChatMessage::character(0, "Hello"));
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
    fn body_ends_on_user_turn() {
        let adapter = MistralAdapter::new("key");
        let body = adapter.build_body(&request(), 0, false);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.last().unwrap()["role"], "user");
        assert_eq!(messages.last().unwrap()["content"], "(continue)");
    }

    #[test]
    fn vendor_extras_included_when_set() {
        let adapter = MistralAdapter::new("key");
        let mut req = request();
        req.settings.safe_prompt = Some(true);
        req.settings.random_seed = Some(42);

        let body = adapter.build_body(&req, 0, false);
        assert_eq!(body["safe_prompt"], true);
        assert_eq!(body["random_seed"], 42);
    }

    #[test]
    fn random_seed_omitted_by_default() {
        let adapter = MistralAdapter::new("key");
        let body = adapter.build_body(&request(), 0, false);
        assert_eq!(body["safe_prompt"], false);
        assert!(body.get("random_seed").is_none());
    }
}
