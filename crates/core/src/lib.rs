//! # Loreweave Core
//!
//! Domain types and error definitions for the Loreweave character-chat
//! engine. This crate has **zero framework dependencies** — it defines the
//! value objects that the prompt builder and the provider adapters share.
//!
//! ## Design Philosophy
//!
//! Everything here is data: characters, chats, lorebooks, the vendor-neutral
//! prompt entry, and the canonical reply/error envelope every provider
//! adapter must produce. Behavior lives in the `prompt` and `providers`
//! crates, which depend inward on this one.

pub mod character;
pub mod chat;
pub mod error;
pub mod generation;
pub mod lorebook;
pub mod macros;
pub mod prompt;
pub mod reply;

// Re-export key types at crate root for ergonomics
pub use character::Character;
pub use chat::{Candidate, Chat, ChatMessage};
pub use error::{Error, ProviderError, Result};
pub use generation::{GenerationRequest, GenerationSettings};
pub use lorebook::{Lorebook, LorebookEntry};
pub use prompt::{PromptConfigEntry, PromptEntry, PromptRole, SlotKey};
pub use reply::{ErrorEnvelope, Outcome, Reply, ReplyCandidate};
