//! Provider adapters for Loreweave.
//!
//! One [`Adapter`] trait, seven vendor implementations, and the SSE
//! stream-normalization machinery they share. Every adapter consumes the
//! prompt builder's entry list, applies its vendor's shape transforms,
//! issues the HTTP call, and parses the response — streaming or not — into
//! the canonical [`loreweave_core::Outcome`] envelope.
//!
//! Adapters hold no per-call mutable state: the streaming carry-over buffer
//! lives in a caller-owned [`StreamState`], so concurrent generations
//! against one vendor can never corrupt each other.

pub mod adapter;
pub mod anthropic;
pub mod deepseek;
pub mod google;
pub mod mistral;
pub mod openai;
pub mod router;
pub mod sse;
pub mod transform;
pub mod wire;
pub mod xai;
pub mod zai;

pub use adapter::{Adapter, CancelToken, drive_stream, stream_outcomes};
pub use anthropic::AnthropicAdapter;
pub use deepseek::DeepSeekAdapter;
pub use google::GoogleAdapter;
pub use mistral::MistralAdapter;
pub use openai::OpenAiAdapter;
pub use router::AdapterRouter;
pub use sse::StreamState;
pub use xai::XaiAdapter;
pub use zai::ZaiAdapter;
