//! xAI adapter.
//!
//! `POST {base}/v1/chat/completions`, Bearer auth. OpenAI wire dialect;
//! grok reasoning models take a `reasoning_effort` knob and stream
//! `reasoning_content` deltas.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::{SettingChoice, SettingSchema};
use loreweave_core::generation::GenerationRequest;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::sanitize_stop_sequences;
use crate::wire::ApiMessage;

const DEFAULT_BASE_URL: &str = "https://api.x.ai";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "grok-3"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 1.0, 0.0, 2.0),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 1.0, 0.0, 1.0),
        SettingSchema::number("frequency_penalty", "Frequency Penalty", "Penalize repeated tokens", 0.0, -2.0, 2.0),
        SettingSchema::number("presence_penalty", "Presence Penalty", "Penalize tokens already present", 0.0, -2.0, 2.0),
        SettingSchema::number("max_tokens", "Max Tokens", "Completion length cap", 1024.0, 1.0, 131_072.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
        SettingSchema::select(
            "reasoning_effort",
            "Reasoning Effort",
            "How hard grok reasoning models think",
            "low",
            vec![
                SettingChoice { value: "low", label: "Low" },
                SettingChoice { value: "high", label: "High" },
            ],
        ),
    ]
});

/// The xAI chat-completions adapter.
#[derive(Debug)]
pub struct XaiAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl XaiAdapter {
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
impl Adapter for XaiAdapter {
    fn name(&self) -> &'static str {
        "xai"
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

        if let Some(effort) = &settings.reasoning_effort {
            body["reasoning_effort"] = json!(effort);
        }

        body
    }
}
