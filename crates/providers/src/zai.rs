//! Z.AI adapter.
//!
//! `POST {base}/api/paas/v4/chat/completions`, Bearer auth. OpenAI wire
//! dialect with a `thinking` toggle for GLM reasoning models, which stream
//! `reasoning_content` deltas.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::SettingSchema;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::PromptEntry;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::{sanitize_stop_sequences, squash};
use crate::wire::ApiMessage;

const DEFAULT_BASE_URL: &str = "https://api.z.ai";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "glm-4.5"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 0.75, 0.0, 1.0),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 0.9, 0.0, 1.0),
        SettingSchema::number("max_tokens", "Max Tokens", "Completion length cap", 1024.0, 1.0, 98_304.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
        SettingSchema::toggle("thinking", "Thinking", "Enable GLM reasoning", false),
    ]
});

/// The Z.AI chat-completions adapter.
#[derive(Debug)]
pub struct ZaiAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ZaiAdapter {
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
impl Adapter for ZaiAdapter {
    fn name(&self) -> &'static str {
        "zai"
    }

    fn settings_schema(&self) -> &'static [SettingSchema] {
        &API_SETTINGS
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint(&self, _request: &GenerationRequest, _stream: bool) -> String {
        format!("{}/api/paas/v4/chat/completions", self.base_url)
    }

    fn status_url(&self) -> String {
        format!("{}/api/paas/v4/models", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn transform(&self, entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
        squash(entries, "\n\n")
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
        });

        let stops = sanitize_stop_sequences(&settings.stop_sequences, request.names());
        if !stops.is_empty() {
            body["stop"] = json!(stops);
        }

        if let Some(thinking) = settings.thinking {
            body["thinking"] = json!({
                "type": if thinking { "enabled" } else { "disabled" },
            });
        }

        body
    }
}
