//! The shared provider contract.
//!
//! Seven vendors implement one trait. The hard logic — SSE reassembly,
//! canonical envelope construction, HTTP status mapping, the streaming
//! drive — lives in the trait's provided methods; a concrete adapter
//! supplies its endpoint, auth header, body construction, and the payload
//! extraction hooks, and inherits the rest.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use loreweave_config::schema::{SettingSchema, find};
use loreweave_core::error::ProviderError;
use loreweave_core::generation::GenerationRequest;
use loreweave_core::prompt::PromptEntry;
use loreweave_core::reply::{ErrorEnvelope, Outcome, Reply};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::sse::{SseLine, StreamState, classify};
use crate::wire;

/// Explicit cancellation for one in-flight streaming call. Triggering it
/// stops draining the response body and discards the carry-over buffer
/// without emitting a further reply.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// One LLM vendor. Implementations are stateless singletons; all per-call
/// mutable state lives in the caller's [`StreamState`] and [`Reply`].
#[async_trait]
pub trait Adapter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// The declarative settings table: renders configuration UI and supplies
    /// every default `build_body` falls back to.
    fn settings_schema(&self) -> &'static [SettingSchema];

    fn client(&self) -> &reqwest::Client;

    /// Chat endpoint URL for this call.
    fn endpoint(&self, request: &GenerationRequest, stream: bool) -> String;

    /// URL probed by [`Adapter::get_status`].
    fn status_url(&self) -> String;

    /// Attach this vendor's auth header(s).
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder;

    /// The vendor JSON body for one call.
    fn build_body(&self, request: &GenerationRequest, offset: usize, stream: bool) -> serde_json::Value;

    /// Vendor-specific shape transforms over the builder's output.
    fn transform(&self, entries: Vec<PromptEntry>) -> Vec<PromptEntry> {
        entries
    }

    /// Re-shape a vendor error field, if the payload carries one.
    fn extract_error(&self, value: &serde_json::Value) -> Option<ErrorEnvelope> {
        wire::extract_error(value)
    }

    /// Fold one complete (non-streaming) payload into the reply.
    fn extract_message(&self, value: &serde_json::Value, reply: &mut Reply) {
        wire::extract_message(value, reply);
    }

    /// Fold one streaming payload into the reply. Returns true when the
    /// vendor signalled completion.
    fn extract_delta(&self, value: &serde_json::Value, reply: &mut Reply) -> bool {
        wire::extract_delta(value, reply)
    }

    /// Token estimate for this vendor's active model.
    fn count_tokens(&self, text: &str, model: &str) -> usize {
        loreweave_prompt::count_tokens(text, model)
    }

    /// Build and transform the prompt for this vendor.
    fn make_prompt(&self, request: &GenerationRequest, offset: usize) -> Vec<PromptEntry> {
        self.transform(loreweave_prompt::build(request, offset))
    }

    /// The canonical empty envelope every generation starts from.
    fn create_reply(&self, swipe: Option<bool>, replace: Option<bool>) -> Reply {
        Reply::new(0, swipe, replace)
    }

    /// Cheap liveness probe. Never errors: failures surface as `false`.
    async fn get_status(&self) -> bool {
        let url = self.status_url();
        match self.authorize(self.client().get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(adapter = self.name(), error = %e, "Status probe failed");
                false
            }
        }
    }

    /// Issue the HTTP call and return the raw, undrained response.
    async fn generate(&self, request: &GenerationRequest) -> Result<reqwest::Response, ProviderError> {
        let stream = request.settings.stream;
        let body = self.build_body(request, request.offset(), stream);
        let url = self.endpoint(request, stream);

        debug!(adapter = self.name(), stream, "Sending generation request");

        let mut builder = self
            .authorize(self.client().post(&url))
            .header("Content-Type", "application/json");
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        }

        let response = builder.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(e.to_string())
            } else {
                ProviderError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(adapter = self.name(), status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        Ok(response)
    }

    /// Parse one complete JSON payload (non-streaming path).
    ///
    /// `None` means the payload was incomplete: the raw text is held in
    /// `state` and the caller must not treat the call as terminal yet.
    fn receive_data(&self, raw: &str, state: &mut StreamState, reply: &mut Reply) -> Option<Outcome> {
        let folded = state.fold(raw);
        match serde_json::from_str::<serde_json::Value>(&folded) {
            Ok(value) => {
                state.clear();
                if let Some(envelope) = self.extract_error(&value) {
                    return Some(envelope.into());
                }
                self.extract_message(&value, reply);
                reply.done = true;
                Some(Outcome::Reply(reply.clone()))
            }
            Err(_) => {
                state.hold(&folded);
                None
            }
        }
    }

    /// Feed one network chunk of an SSE stream.
    ///
    /// Deltas accumulate onto `reply`; the return value is `Some` only for
    /// a terminal outcome (sentinel, finish signal, or vendor error). A JSON
    /// parse failure on a trailing partial line is not an error: the
    /// fragment is held in `state` and resolved by the next chunk.
    fn receive_stream(&self, chunk: &str, state: &mut StreamState, reply: &mut Reply) -> Option<Outcome> {
        let folded = state.fold(chunk);
        for line in folded.split('\n') {
            match classify(line) {
                SseLine::Skip => continue,
                SseLine::Done => {
                    state.clear();
                    reply.done = true;
                    return Some(Outcome::Reply(reply.clone()));
                }
                SseLine::Data(data) => match serde_json::from_str::<serde_json::Value>(data) {
                    Ok(value) => {
                        state.clear();
                        if let Some(envelope) = self.extract_error(&value) {
                            return Some(envelope.into());
                        }
                        if self.extract_delta(&value, reply) {
                            reply.done = true;
                            return Some(Outcome::Reply(reply.clone()));
                        }
                    }
                    Err(e) => {
                        trace!(adapter = self.name(), error = %e, "Holding partial SSE line");
                        state.hold(line);
                    }
                },
            }
        }
        None
    }
}

fn progress(reply: &Reply) -> usize {
    reply.candidate.text.len() + reply.candidate.reasoning.as_ref().map_or(0, |r| r.len())
}

/// Drain the decodable UTF-8 prefix of `pending`, leaving an incomplete
/// trailing sequence in place for the next chunk. Network chunk boundaries
/// fall anywhere, including inside a multi-byte character; decoding each
/// chunk independently would turn those into U+FFFD.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    let valid_len = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        // Invalid bytes, not a truncated sequence. Nothing to wait for.
        Err(_) => {
            let bytes = std::mem::take(pending);
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    };
    let rest = pending.split_off(valid_len);
    let head = std::mem::replace(pending, rest);
    String::from_utf8_lossy(&head).into_owned()
}

/// Drive one streaming response to completion.
///
/// Drains `response.bytes_stream()` on a spawned task, strictly sequential
/// per stream: chunk *n+1* is never folded in before chunk *n*'s carry-over
/// has been. Emits a partial [`Outcome::Reply`] whenever a chunk produced
/// new text, then exactly one terminal outcome. Stops early when the
/// receiver is dropped or `cancel` triggers, discarding the buffer without
/// a further reply.
pub fn stream_outcomes(
    adapter: Arc<dyn Adapter>,
    response: reqwest::Response,
    reply: Reply,
    cancel: CancelToken,
) -> mpsc::Receiver<Outcome> {
    drive_stream(adapter, response.bytes_stream(), reply, cancel)
}

/// [`stream_outcomes`] over any chunked byte source.
pub fn drive_stream<S, B, E>(
    adapter: Arc<dyn Adapter>,
    byte_stream: S,
    reply: Reply,
    cancel: CancelToken,
) -> mpsc::Receiver<Outcome>
where
    S: futures::Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: std::fmt::Display + Send,
{
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut state = StreamState::new();
        let mut pending: Vec<u8> = Vec::new();
        let mut reply = reply;

        while let Some(chunk_result) = byte_stream.next().await {
            if cancel.is_cancelled() {
                debug!(adapter = adapter.name(), "Stream cancelled");
                return;
            }

            let bytes = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    let err = ProviderError::StreamInterrupted(e.to_string());
                    let _ = tx.send(Outcome::Error((&err).into())).await;
                    return;
                }
            };

            pending.extend_from_slice(bytes.as_ref());
            let text = drain_utf8(&mut pending);
            if text.is_empty() {
                // Chunk ended mid code point.
                continue;
            }
            let before = progress(&reply);

            if let Some(outcome) = adapter.receive_stream(&text, &mut state, &mut reply) {
                let _ = tx.send(outcome).await;
                return;
            }

            if progress(&reply) > before
                && tx.send(Outcome::Reply(reply.clone())).await.is_err()
            {
                return; // receiver dropped
            }
        }

        // Stream ended without a sentinel or finish signal.
        reply.done = true;
        let _ = tx.send(Outcome::Reply(reply)).await;
    });

    rx
}

/// Build the shared HTTP client for one adapter.
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client")
}

/// Numeric default from a settings table.
pub(crate) fn schema_f64(table: &[SettingSchema], key: &str) -> f64 {
    find(table, key).map(|s| s.default_f64()).unwrap_or(0.0)
}

/// Text default from a settings table.
pub(crate) fn schema_str<'a>(table: &'a [SettingSchema], key: &str) -> &'a str {
    find(table, key).map(|s| s.default_str()).unwrap_or("")
}
