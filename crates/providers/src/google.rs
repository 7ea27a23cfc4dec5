//! Google Gemini adapter.
//!
//! `POST {base}/v1beta/models/{model}:generateContent` (non-streaming) and
//! `:streamGenerateContent?alt=sse` (streaming), `x-goog-api-key` header.
//! Roles are renamed `assistant -> model`, system entries become the
//! top-level `systemInstruction`, and the sequence must both start and end
//! on a user turn. No `[DONE]` sentinel: stream end terminates.

use std::sync::LazyLock;

use async_trait::async_trait;
use loreweave_config::schema::SettingSchema;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::{PromptEntry, PromptRole};
use loreweave_core::reply::Reply;
use serde::Deserialize;
use serde_json::json;

use crate::adapter::{Adapter, http_client, schema_f64, schema_str};
use crate::transform::{
    ensure_leading_user, ensure_trailing_user, extract_system, sanitize_stop_sequences, squash,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

static API_SETTINGS: LazyLock<Vec<SettingSchema>> = LazyLock::new(|| {
    vec![
        SettingSchema::text("model", "Model", "Model identifier", "gemini-2.0-flash"),
        SettingSchema::number("temperature", "Temperature", "Sampling temperature", 1.0, 0.0, 2.0),
        SettingSchema::number("top_p", "Top P", "Nucleus sampling cutoff", 0.95, 0.0, 1.0),
        SettingSchema::number("max_tokens", "Max Output Tokens", "Completion length cap", 1024.0, 1.0, 65_536.0),
        SettingSchema::toggle("stream", "Stream", "SSE streaming", true),
    ]
});

/// The Google Gemini generateContent adapter.
#[derive(Debug)]
pub struct GoogleAdapter {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleAdapter {
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

    fn model_for(&self, request: &GenerationRequest) -> String {
        request
            .settings
            .model
            .clone()
            .unwrap_or_else(|| schema_str(self.settings_schema(), "model").to_string())
    }

    fn to_contents(entries: &[PromptEntry]) -> serde_json::Value {
        let contents: Vec<serde_json::Value> = entries
            .iter()
            .map(|e| {
                let role = match e.role {
                    PromptRole::Assistant => "model",
                    _ => "user",
                };
                json!({ "role": role, "parts": [{ "text": e.content }] })
            })
            .collect();
        json!(contents)
    }

    fn fold_candidates(value: &serde_json::Value, reply: &mut Reply) -> bool {
        let Ok(response) = serde_json::from_value::<GenerateResponse>(value.clone()) else {
            return false;
        };
        if let Some(model) = &response.model_version {
            reply.set_model(model);
        }
        let Some(candidate) = response.candidates.first() else {
            return false;
        };
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(text) = &part.text {
                    reply.push_text(text);
                }
            }
        }
        candidate.finish_reason.is_some()
    }
}

#[async_trait]
impl Adapter for GoogleAdapter {
    fn name(&self) -> &'static str {
        "google"
    }

    fn settings_schema(&self) -> &'static [SettingSchema] {
        &API_SETTINGS
    }

    fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn endpoint(&self, request: &GenerationRequest, stream: bool) -> String {
        let model = self.model_for(request);
        if stream {
            format!("{}/v1beta/models/{model}:streamGenerateContent?alt=sse", self.base_url)
        } else {
            format!("{}/v1beta/models/{model}:generateContent", self.base_url)
        }
    }

    fn status_url(&self) -> String {
        format!("{}/v1beta/models", self.base_url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("x-goog-api-key", &self.api_key)
    }

    fn transform(&self, entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
        ensure_trailing_user(ensure_leading_user(squash(entries, "\n\n")))
    }

    /// The wire content list: system entries are lifted into the top-level
    /// `systemInstruction` field, so they never appear here.
    fn make_prompt(&self, request: &GenerationRequest, offset: usize) -> Vec<PromptEntry> {
        let (_, rest) = extract_system(loreweave_prompt::build(request, offset));
        self.transform(rest)
    }

    fn build_body(&self, request: &GenerationRequest, offset: usize, _stream: bool) -> serde_json::Value {
        let schema = self.settings_schema();
        let settings = &request.settings;

        let (system, rest) = extract_system(loreweave_prompt::build(request, offset));
        let contents = self.transform(rest);

        let mut generation_config = json!({
            "temperature": settings.temperature.map(f64::from).unwrap_or(schema_f64(schema, "temperature")),
            "topP": settings.top_p.map(f64::from).unwrap_or(schema_f64(schema, "top_p")),
            "maxOutputTokens": settings.max_tokens.unwrap_or(schema_f64(schema, "max_tokens") as u32),
        });
        let stops = sanitize_stop_sequences(&settings.stop_sequences, request.names());
        if !stops.is_empty() {
            generation_config["stopSequences"] = json!(stops);
        }

        let mut body = json!({
            "contents": Self::to_contents(&contents),
            "generationConfig": generation_config,
        });
        if let Some(system) = system {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }

        body
    }

    fn extract_message(&self, value: &serde_json::Value, reply: &mut Reply) {
        Self::fold_candidates(value, reply);
    }

    fn extract_delta(&self, value: &serde_json::Value, reply: &mut Reply) -> bool {
        Self::fold_candidates(value, reply)
    }
}

// --- generateContent payload shapes ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseCandidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use loreweave_core::chat::{Chat, ChatMessage};
    use loreweave_core::character::Character;
    use loreweave_core::generation::GenerationSettings;
    use loreweave_core::prompt::{PromptConfigEntry, SlotKey};
    use loreweave_core::reply::Outcome;
    use crate::sse::StreamState;

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
            prompt_config: vec![
                PromptConfigEntry::with_content(SlotKey::BasePrompt, "You are {{char}}."),
                PromptConfigEntry::new(SlotKey::Messages),
            ],
            lorebooks: Vec::new(),
            swipe: false,
        }
    }

    #[test]
    fn endpoint_switches_on_stream() {
        let adapter = GoogleAdapter::new("key");
        let req = request();
        assert!(adapter.endpoint(&req, false).ends_with("models/gemini-2.0-flash:generateContent"));
        assert!(adapter.endpoint(&req, true).ends_with(":streamGenerateContent?alt=sse"));
    }

    #[test]
    fn body_renames_roles_and_lifts_system() {
        let adapter = GoogleAdapter::new("key");
        let body = adapter.build_body(&request(), 0, true);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Aria.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        // Assistant-terminated history gets the trailing user repair.
        assert_eq!(body["contents"][2]["role"], "user");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "(continue)");
        assert_eq!(body["generationConfig"]["topP"], 0.95);
    }

    #[test]
    fn make_prompt_matches_wire_contents() {
        let adapter = GoogleAdapter::new("key");
        let req = request();
        let prompt = adapter.make_prompt(&req, 0);
        assert!(prompt.iter().all(|e| e.role != PromptRole::System));

        let body = adapter.build_body(&req, 0, false);
        let wire = body["contents"].as_array().unwrap();
        assert_eq!(wire.len(), prompt.len());
        for (sent, built) in wire.iter().zip(&prompt) {
            assert_eq!(sent["parts"][0]["text"], built.content.as_str());
        }
    }

    #[test]
    fn stream_chunks_accumulate_until_finish_reason() {
        let adapter = GoogleAdapter::new("key");
        let mut state = StreamState::new();
        let mut reply = adapter.create_reply(None, None);

        let chunk = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n";
        assert!(adapter.receive_stream(chunk, &mut state, &mut reply).is_none());

        let last = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}],\"modelVersion\":\"gemini-2.0-flash\"}\n\n";
        let outcome = adapter.receive_stream(last, &mut state, &mut reply);
        match outcome {
            Some(Outcome::Reply(r)) => {
                assert!(r.done);
                assert_eq!(r.candidate.text, "Hello");
                assert_eq!(r.candidate.model.as_deref(), Some("gemini-2.0-flash"));
            }
            other => panic!("expected terminal reply, got {other:?}"),
        }
    }

    #[test]
    fn vendor_error_uses_status_as_kind() {
        let adapter = GoogleAdapter::new("key");
        let mut state = StreamState::new();
        let mut reply = adapter.create_reply(None, None);

        let raw = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let outcome = adapter.receive_data(raw, &mut state, &mut reply).unwrap();
        match outcome {
            Outcome::Error(env) => {
                assert_eq!(env.error.kind.as_deref(), Some("RESOURCE_EXHAUSTED"));
            }
            other => panic!("expected error outcome, got {other:?}"),
        }
    }

    #[test]
    fn non_streaming_reply_extracted() {
        let adapter = GoogleAdapter::new("key");
        let mut state = StreamState::new();
        let mut reply = adapter.create_reply(None, None);

        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello there."}],"role":"model"},"finishReason":"STOP"}],"modelVersion":"gemini-2.0-flash"}"#;
        let outcome = adapter.receive_data(raw, &mut state, &mut reply).unwrap();
        match outcome {
            Outcome::Reply(r) => {
                assert!(r.done);
                assert_eq!(r.candidate.text, "Hello there.");
            }
            other => panic!("expected reply, got {other:?}"),
        }
    }
}
