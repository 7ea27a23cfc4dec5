//! One conformance suite, seven adapters.
//!
//! Every adapter must turn its vendor's representative payloads into the
//! same canonical envelope: a `Reply` with accumulated candidate text, or a
//! well-formed `Error` — never a raw vendor object. The streaming fixtures
//! are additionally replayed split at every byte boundary to prove the
//! carry-over reassembly is split-point independent.

use std::sync::Arc;

use loreweave_core::reply::{Outcome, Reply};
use loreweave_providers::{
    Adapter, AnthropicAdapter, DeepSeekAdapter, GoogleAdapter, MistralAdapter, OpenAiAdapter,
    StreamState, XaiAdapter, ZaiAdapter,
};

struct Fixture {
    adapter: Arc<dyn Adapter>,
    /// A complete SSE stream producing `expected_text`.
    stream: &'static str,
    /// A complete non-streaming body producing `expected_text`.
    data: &'static str,
    /// A vendor error body.
    error: &'static str,
    expected_text: &'static str,
}

const OPENAI_STREAM: &str = "data: {\"model\":\"m\",\"choices\":[{\"delta\":{\"content\":\"Hel\"},\"finish_reason\":null}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo\"},\"finish_reason\":null}]}\n\n\
data: [DONE]\n\n";

const OPENAI_DATA: &str =
    r#"{"model":"m","choices":[{"message":{"content":"Hello","role":"assistant"}}]}"#;

const OPENAI_ERROR: &str =
    r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;

fn fixtures() -> Vec<Fixture> {
    vec![
        Fixture {
            adapter: Arc::new(OpenAiAdapter::new("k")),
            stream: OPENAI_STREAM,
            data: OPENAI_DATA,
            error: OPENAI_ERROR,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(AnthropicAdapter::new("k")),
            stream: "event: message_start\n\
data: {\"type\":\"message_start\",\"message\":{\"model\":\"m\"}}\n\n\
event: content_block_delta\n\
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel\"}}\n\n\
event: content_block_delta\n\
data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"lo\"}}\n\n\
event: message_stop\n\
data: {\"type\":\"message_stop\"}\n\n",
            data: r#"{"model":"m","content":[{"type":"text","text":"Hello"}],"stop_reason":"end_turn"}"#,
            error: r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(GoogleAdapter::new("k")),
            stream: "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Hel\"}]}}]}\n\n\
data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"lo\"}]},\"finishReason\":\"STOP\"}]}\n\n",
            data: r#"{"candidates":[{"content":{"parts":[{"text":"Hello"}],"role":"model"},"finishReason":"STOP"}]}"#,
            error: r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(MistralAdapter::new("k")),
            stream: OPENAI_STREAM,
            data: OPENAI_DATA,
            error: OPENAI_ERROR,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(DeepSeekAdapter::new("k")),
            stream: "data: {\"model\":\"deepseek-reasoner\",\"choices\":[{\"delta\":{\"reasoning_content\":\"hmm\"},\"finish_reason\":null}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n\
data: [DONE]\n\n",
            data: r#"{"model":"deepseek-chat","choices":[{"message":{"content":"Hello","reasoning_content":"hmm"}}]}"#,
            error: OPENAI_ERROR,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(XaiAdapter::new("k")),
            stream: OPENAI_STREAM,
            data: OPENAI_DATA,
            error: OPENAI_ERROR,
            expected_text: "Hello",
        },
        Fixture {
            adapter: Arc::new(ZaiAdapter::new("k")),
            stream: OPENAI_STREAM,
            data: OPENAI_DATA,
            error: OPENAI_ERROR,
            expected_text: "Hello",
        },
    ]
}

/// Feed an SSE payload in the given pieces; return the terminal reply.
fn run_stream(adapter: &Arc<dyn Adapter>, pieces: &[&str]) -> Option<Reply> {
    let mut state = StreamState::new();
    let mut reply = adapter.create_reply(None, None);
    for piece in pieces {
        if let Some(outcome) = adapter.receive_stream(piece, &mut state, &mut reply) {
            match outcome {
                Outcome::Reply(r) => return Some(r),
                Outcome::Error(env) => panic!("unexpected error outcome: {env:?}"),
            }
        }
    }
    None
}

#[test]
fn every_adapter_reaches_a_terminal_reply_when_streaming() {
    for fixture in fixtures() {
        let reply = run_stream(&fixture.adapter, &[fixture.stream])
            .unwrap_or_else(|| panic!("{}: stream did not terminate", fixture.adapter.name()));
        assert!(reply.done, "{}: terminal reply not done", fixture.adapter.name());
        assert_eq!(
            reply.candidate.text,
            fixture.expected_text,
            "{}: wrong accumulated text",
            fixture.adapter.name()
        );
    }
}

#[test]
fn streaming_reassembly_is_split_point_independent() {
    for fixture in fixtures() {
        let whole = run_stream(&fixture.adapter, &[fixture.stream])
            .expect("whole payload must terminate");

        for split in 0..=fixture.stream.len() {
            let (a, b) = fixture.stream.split_at(split);
            let reply = run_stream(&fixture.adapter, &[a, b]).unwrap_or_else(|| {
                panic!("{}: split at {split} did not terminate", fixture.adapter.name())
            });
            assert_eq!(
                reply.candidate.text,
                whole.candidate.text,
                "{}: split at {split} diverged",
                fixture.adapter.name()
            );
        }
    }
}

#[test]
fn every_adapter_extracts_a_complete_payload() {
    for fixture in fixtures() {
        let mut state = StreamState::new();
        let mut reply = fixture.adapter.create_reply(None, None);
        let outcome = fixture
            .adapter
            .receive_data(fixture.data, &mut state, &mut reply)
            .unwrap_or_else(|| panic!("{}: complete payload buffered", fixture.adapter.name()));

        match outcome {
            Outcome::Reply(r) => {
                assert!(r.done);
                assert_eq!(r.candidate.text, fixture.expected_text);
            }
            Outcome::Error(env) => {
                panic!("{}: unexpected error {env:?}", fixture.adapter.name())
            }
        }
    }
}

#[test]
fn every_adapter_reshapes_vendor_errors() {
    for fixture in fixtures() {
        let mut state = StreamState::new();
        let mut reply = fixture.adapter.create_reply(None, None);
        let outcome = fixture
            .adapter
            .receive_data(fixture.error, &mut state, &mut reply)
            .unwrap_or_else(|| panic!("{}: error payload buffered", fixture.adapter.name()));

        match outcome {
            Outcome::Error(env) => {
                assert!(!env.error.message.is_empty());
                assert!(env.error.kind.is_some(), "{}: error kind lost", fixture.adapter.name());
            }
            Outcome::Reply(r) => {
                panic!("{}: error treated as reply {r:?}", fixture.adapter.name())
            }
        }
    }
}

#[test]
fn partial_payload_is_buffered_not_fatal() {
    for fixture in fixtures() {
        let mut state = StreamState::new();
        let mut reply = fixture.adapter.create_reply(None, None);
        let (head, tail) = fixture.data.split_at(fixture.data.len() / 2);

        assert!(
            fixture.adapter.receive_data(head, &mut state, &mut reply).is_none(),
            "{}: half a payload parsed",
            fixture.adapter.name()
        );
        assert!(
            fixture.adapter.receive_data(tail, &mut state, &mut reply).is_some(),
            "{}: reassembled payload rejected",
            fixture.adapter.name()
        );
    }
}

#[test]
fn terminal_outcomes_serialize_as_single_lines() {
    for fixture in fixtures() {
        let reply = run_stream(&fixture.adapter, &[fixture.stream]).unwrap();
        let line = Outcome::Reply(reply).to_line();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }
}
