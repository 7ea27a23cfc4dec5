//! Macro and name substitution.
//!
//! The one place placeholder expansion happens. Every constructed prompt
//! entry, lorebook block and stop sequence goes through [`substitute`]
//! exactly once — never skipped, never double-applied.
//!
//! Supported forms:
//! - `{{user}}` / `{{char}}` (case-insensitive)
//! - `{{charname}}` — legacy alias for `{{char}}`
//! - `<USER>` / `<BOT>` — legacy angle-bracket aliases (exact case)

/// Names fed into the substitution pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Names<'a> {
    pub user: &'a str,
    pub character: &'a str,
}

impl<'a> Names<'a> {
    pub fn new(user: &'a str, character: &'a str) -> Self {
        Self { user, character }
    }
}

/// Replace every placeholder in `text` and trim surrounding whitespace.
pub fn substitute(text: &str, names: Names<'_>) -> String {
    let mut out = text.to_string();
    // Longer patterns first so `{{charname}}` is not eaten by `{{char}}`.
    out = replace_ci(&out, "{{charname}}", names.character);
    out = replace_ci(&out, "{{char}}", names.character);
    out = replace_ci(&out, "{{user}}", names.user);
    out = out.replace("<BOT>", names.character);
    out = out.replace("<USER>", names.user);
    out.trim().to_string()
}

/// Expand the literal `{{original}}` placeholder inside an override
/// template, or report that the template does not carry one.
pub fn expand_original(template: &str, original: &str) -> Option<String> {
    if template.contains("{{original}}") {
        Some(template.replace("{{original}}", original))
    } else {
        None
    }
}

/// Case-insensitive literal replacement. Patterns here are pure ASCII, so a
/// byte-wise comparison against the lowercased haystack is sound.
fn replace_ci(haystack: &str, pattern: &str, replacement: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut rest = 0;
    let mut search = 0;
    while let Some(pos) = lower[search..].find(&pattern) {
        let at = search + pos;
        out.push_str(&haystack[rest..at]);
        out.push_str(replacement);
        rest = at + pattern.len();
        search = rest;
    }
    out.push_str(&haystack[rest..]);
    out
}
