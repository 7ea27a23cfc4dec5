//! Anthropic adapter.
//!
//! `POST {base}/v1/messages`, `x-api-key` + `anthropic-version` headers.
//! System entries leave the message list (top-level `system` field), the
//! sequence must start with a user turn, and a trailing assistant turn is
//! legal (prefill). Streaming is typed SSE events rather than bare deltas;
//! there is no `[DONE]` sentinel.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::SettingSchema;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::PromptEntry;
use loreweave_core::reply::Reply;
use serde::Deserialize;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::{ensure_leading_user, extract_system, sanitize_stop_sequences, squash};
use crate::wire::ApiMessage;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "claude-sonnet-4-20250514"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 1.0, 0.0, 1.0),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 1.0, 0.0, 1.0),
        SettingSchema::number("max_tokens", "Max Tokens", "Completion length cap", 1024.0, 1.0, 64_000.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
        SettingSchema::toggle("prompt_caching", "Prompt Caching", "Mark the system prompt cacheable", false),
    ]
});

/// The Anthropic Messages API adapter.
#[derive(Debug)]
pub struct AnthropicAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicAdapter {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            // Anthropic can be slow with extended thinking
            client: http_client(300),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Adapter for AnthropicAdapter {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn settings_schema(&self) -> &'static [SettingSchema] {
        &API_SETTINGS
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint(&self, _request: &GenerationRequest, _stream: bool) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
    }

    fn transform(&self, entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
        ensure_leading_user(squash(entries, "\n\n"))
    }

    /// The wire message list: system entries are lifted into the top-level
    /// `system` field, so they never appear here.
    fn make_prompt(&self, request: &GenerationRequest, offset: usize) -> Vec<PromptEntry> {
        let (_, rest) = extract_system(loreweave_prompt::build(request, offset));
        self.transform(rest)
    }

    fn build_body(&self, request: &GenerationRequest, offset: usize, stream: bool) -> serde_json::Value {
        let schema = self.settings_schema();
        let settings = &request.settings;
        let model = settings
            .model
            .clone()
            .unwrap_or_else(|| schema_str(schema, "model").to_string());

        let (system, rest) = extract_system(loreweave_prompt::build(request, offset));
        let messages = self.transform(rest);

        let mut body = json!({
            "model": model,
            "messages": ApiMessage::from_entries(&messages),
            "temperature": settings.temperature.map(f64::from).unwrap_or(schema_f64(schema, "temperature")),
            "top_p": settings.top_p.map(f64::from).unwrap_or(schema_f64(schema, "top_p")),
            "max_tokens": settings.max_tokens.unwrap_or(schema_f64(schema, "max_tokens") as u32),
            "stream": stream,
        });

        if let Some(system) = system {
            if settings.prompt_caching.unwrap_or(false) {
                body["system"] = json!([{
                    "type": "text",
                    "text": system,
                    "cache_control": { "type": "ephemeral" },
                }]);
            } else {
                body["system"] = json!(system);
            }
        }

        let stops = sanitize_stop_sequences(&settings.stop_sequences, request.names());
        if !stops.is_empty() {
            body["stop_sequences"] = json!(stops);
        }

        body
    }

    fn extract_message(&self, value: &serde_json::Value, reply: &mut Reply) {
        let Ok(response) = serde_json::from_value::<MessagesResponse>(value.clone()) else {
            return;
        };
        if let Some(model) = &response.model {
            reply.set_model(model);
        }
        for block in &response.content {
            match block.r#type.as_str() {
                "text" => {
                    if let Some(text) = &block.text {
                        reply.push_text(text);
                    }
                }
                "thinking" => {
                    if let Some(thinking) = &block.thinking {
                        reply.push_reasoning(thinking);
                    }
                }
                _ => {}
            }
        }
    }

    fn extract_delta(&self, value: &serde_json::Value, reply: &mut Reply) -> bool {
        let Ok(event) = serde_json::from_value::<StreamEvent>(value.clone()) else {
            return false;
        };
        match event.r#type.as_str() {
            "message_start" => {
                if let Some(model) = event.message.and_then(|m| m.model) {
                    reply.set_model(&model);
                }
                false
            }
            "content_block_delta" => {
                if let Some(delta) = event.delta {
                    if let Some(text) = &delta.text {
                        reply.push_text(text);
                    }
                    if let Some(thinking) = &delta.thinking {
                        reply.push_reasoning(thinking);
                    }
                }
                false
            }
            "message_delta" => event
                .delta
                .is_some_and(|d| d.stop_reason.is_some()),
            "message_stop" => true,
            _ => false,
        }
    }
}

// --- Messages API payload shapes ---

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    r#type: String,
    #[serde(default)]
    message: Option<EventMessage>,
    #[serde(default)]
    delta: Option<EventDelta>,
}

#[derive(Debug, Deserialize)]
struct EventMessage {
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventDelta {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}
