//! # Loreweave Prompt
//!
//! The prompt construction engine: assembles a single, token-budgeted,
//! ordered prompt from heterogeneous sources — character fields, user
//! persona, lorebook entries, chat history, jailbreak/prefill/continuation
//! text.
//!
//! Pipeline: [`registry::normalize`] repairs the user's slot configuration,
//! [`lorebook`] decides which knowledge entries trigger and trims them to a
//! token budget, and [`builder::build`] walks the configuration in order and
//! emits the vendor-neutral `PromptEntry` list the provider adapters
//! consume. Token accounting everywhere goes through [`token`].

pub mod builder;
pub mod lorebook;
pub mod registry;
pub mod token;

pub use builder::build;
pub use lorebook::{SelectedEntry, render, select_entries};
pub use registry::normalize;
pub use token::{ModelFamily, count_entry_tokens, count_tokens};
