//! Prompt assembly.
//!
//! [`build`] walks the normalized slot configuration in order and emits the
//! vendor-neutral entry list. Output order is load-bearing: it is the final
//! conversation order sent to the provider, and adapters may only transform
//! it predictably (merge, rename), never reorder.

use loreweave_core::generation::GenerationRequest;
use loreweave_core::macros::{Names, expand_original, substitute};
use loreweave_core::prompt::{PromptConfigEntry, PromptEntry, PromptRole, SlotKey};
use tracing::debug;

use crate::lorebook::{render, select_entries};
use crate::registry::normalize;
use crate::token::{count_entry_tokens, count_tokens};

/// Fallback history budget when settings carry no `context_size`.
pub const DEFAULT_CONTEXT_SIZE: usize = 4096;

/// Assemble the ordered prompt for one generation call.
///
/// `offset` is the history offset ([`GenerationRequest::offset`]): `1` when
/// regenerating a swipe, so the message being replaced is not part of its
/// own prompt.
pub fn build(request: &GenerationRequest, offset: usize) -> Vec<PromptEntry> {
    let config = normalize(&request.prompt_config);
    let names = request.names();
    let model = request.settings.model.as_deref().unwrap_or("");

    let mut out: Vec<PromptEntry> = Vec::new();

    for entry in &config {
        let Some(key) = entry.slot() else { continue };

        // `messages` is always processed and `custom` keys the enabled flag
        // is advisory for; everything else honors the toggle.
        match key {
            SlotKey::Messages => {
                assemble_history(&mut out, request, &config, offset, names, model);
                continue;
            }
            SlotKey::Custom => {
                let content = substitute(entry.content_str(), names);
                if !content.is_empty() {
                    out.push(slot_entry(entry, content));
                }
                continue;
            }
            _ if !entry.enabled => continue,
            _ => {}
        }

        let content = match key {
            SlotKey::BasePrompt => {
                let configured = entry.content_str();
                if entry.allow_override.unwrap_or(false)
                    && !request.character.system_prompt.is_empty()
                {
                    let card = &request.character.system_prompt;
                    expand_original(card, configured).unwrap_or_else(|| card.clone())
                } else {
                    configured.to_string()
                }
            }
            SlotKey::Description => templated(entry, &request.character.description),
            SlotKey::Personality => templated(entry, &request.character.personality),
            SlotKey::Scenario => templated(entry, &request.character.scenario),
            SlotKey::MesExample => templated(entry, &request.character.mes_example),
            SlotKey::Persona => templated(entry, &request.persona),
            SlotKey::WorldInfo => world_info(request, names, model),
            SlotKey::CharacterBook => character_book(request, names, model),
            // Consumed by the history assembler, no output of their own.
            SlotKey::SubPrompt | SlotKey::ContinuePrompt | SlotKey::PrefillPrompt => {
                continue;
            }
            SlotKey::Messages | SlotKey::Custom => unreachable!(),
        };

        let content = substitute(&content, names);
        if !content.is_empty() {
            out.push(slot_entry(entry, content));
        }
    }

    out
}

fn slot_entry(entry: &PromptConfigEntry, content: String) -> PromptEntry {
    PromptEntry {
        role: entry.role.unwrap_or(PromptRole::System),
        content,
        prefix: false,
    }
}

/// Template expansion for the character-field slots: `{{original}}` in the
/// configured text is replaced by the character field; without the
/// placeholder the field is appended after the configured text. Empty
/// character field skips the slot.
fn templated(entry: &PromptConfigEntry, field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    let template = entry.content_str();
    if let Some(expanded) = expand_original(template, field) {
        expanded
    } else if template.is_empty() {
        field.to_string()
    } else {
        format!("{template}\n{field}")
    }
}

fn world_info(request: &GenerationRequest, names: Names<'_>, model: &str) -> String {
    let counter = |text: &str| count_tokens(text, model);
    let mut blocks = Vec::new();
    for book in request.lorebooks.iter().filter(|b| b.enabled) {
        let selected = select_entries(book, &request.chat, names, &counter);
        if let Some(block) = render(&selected) {
            blocks.push(block);
        }
    }
    blocks.join("\n\n")
}

fn character_book(request: &GenerationRequest, names: Names<'_>, model: &str) -> String {
    let Some(book) = &request.character.character_book else {
        return String::new();
    };
    if !book.enabled {
        return String::new();
    }
    let counter = |text: &str| count_tokens(text, model);
    let selected = select_entries(book, &request.chat, names, &counter);
    render(&selected).unwrap_or_default()
}

/// History assembly for the `messages` slot: offset slice, role mapping,
/// backward token-budget truncation, then the continuation / jailbreak /
/// prefill insertion rules.
fn assemble_history(
    out: &mut Vec<PromptEntry>,
    request: &GenerationRequest,
    config: &[PromptConfigEntry],
    offset: usize,
    names: Names<'_>,
    model: &str,
) {
    let messages = &request.chat.messages;
    let end = messages.len().saturating_sub(offset);

    let mapped: Vec<PromptEntry> = messages[..end]
        .iter()
        .map(|m| {
            let content = substitute(m.active_text(), names);
            if m.is_assistant() {
                PromptEntry::assistant(content)
            } else {
                PromptEntry::user(content)
            }
        })
        .collect();

    // Walk backward accumulating cost; keep the longest suffix that fits.
    let budget = request.settings.context_size.unwrap_or(DEFAULT_CONTEXT_SIZE);
    let mut total = 0usize;
    let mut start = mapped.len();
    for (i, entry) in mapped.iter().enumerate().rev() {
        let cost = count_entry_tokens(entry, model);
        if total + cost > budget {
            break;
        }
        total += cost;
        start = i;
    }
    if start > 0 {
        debug!(dropped = start, total, budget, "Truncated history to fit context");
    }
    let mut history: Vec<PromptEntry> = mapped[start..].to_vec();

    // The jailbreak targets the last user turn of the retained history,
    // found before any continuation turn is appended. A continuation can
    // therefore end up after the jailbreak text.
    let last_user = history.iter().rposition(|e| e.role == PromptRole::User);

    if let Some(cont) = active_slot(config, SlotKey::ContinuePrompt)
        && history.last().map(|e| e.role) != Some(PromptRole::User)
        && !history.is_empty()
    {
        history.push(PromptEntry::user(substitute(cont.content_str(), names)));
    }

    if let Some(sub) = active_slot(config, SlotKey::SubPrompt) {
        let text = jailbreak_text(sub, request);
        let text = substitute(&text, names);
        if !text.is_empty() {
            match last_user {
                Some(at) => {
                    let merged = format!("{}\n\n{text}", history[at].content);
                    history[at].content = merged;
                }
                None => history.push(slot_entry(sub, text)),
            }
        }
    }

    if let Some(prefill) = active_slot(config, SlotKey::PrefillPrompt) {
        let text = substitute(prefill.content_str(), names);
        if !text.is_empty() {
            history.push(PromptEntry {
                role: PromptRole::Assistant,
                content: text,
                prefix: true,
            });
        }
    }

    out.extend(history);
}

fn active_slot(config: &[PromptConfigEntry], key: SlotKey) -> Option<&PromptConfigEntry> {
    config
        .iter()
        .find(|e| e.slot() == Some(key) && e.enabled && !e.content_str().is_empty())
}

/// The jailbreak text, preferring the card's `post_history_instructions`
/// when the slot allows override.
fn jailbreak_text(slot: &PromptConfigEntry, request: &GenerationRequest) -> String {
    let configured = slot.content_str();
    let card = &request.character.post_history_instructions;
    if slot.allow_override.unwrap_or(false) && !card.is_empty() {
        expand_original(card, configured).unwrap_or_else(|| card.clone())
    } else {
        configured.to_string()
    }
}
