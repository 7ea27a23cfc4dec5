//! SSE line reassembly state.
//!
//! Vendor streams arrive as network chunks that may contain zero, one, or
//! many SSE lines, and may end mid-line. [`StreamState`] holds the bytes of
//! an incomplete line between chunks; it is owned by the caller and threaded
//! through every `receive_stream`/`receive_data` call, one instance per
//! in-flight generation.

/// Request-scoped carry-over buffer for one streaming call.
#[derive(Debug, Default)]
pub struct StreamState {
    carry: String,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend the carried fragment to a fresh chunk, consuming it.
    pub fn fold(&mut self, chunk: &str) -> String {
        if self.carry.is_empty() {
            return chunk.to_string();
        }
        let mut folded = std::mem::take(&mut self.carry);
        folded.push_str(chunk);
        folded
    }

    /// Save an unconsumed fragment. Not an error: normal mid-chunk
    /// truncation, resolved once more data arrives.
    pub fn hold(&mut self, fragment: &str) {
        self.carry = fragment.to_string();
    }

    /// Drop the buffer. Called on successful extraction and on hard
    /// failures, so unrecoverable garbage cannot grow without bound.
    pub fn clear(&mut self) {
        self.carry.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.carry.is_empty()
    }
}

/// One parsed SSE line.
#[derive(Debug, PartialEq)]
pub enum SseLine<'a> {
    /// A `data:` payload to hand to the JSON layer.
    Data(&'a str),
    /// The `[DONE]` sentinel.
    Done,
    /// Comment, `event:` tag, or blank line.
    Skip,
}

/// Classify one line of an SSE stream.
pub fn classify(line: &str) -> SseLine<'_> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') || line.starts_with("event:") {
        return SseLine::Skip;
    }
    let data = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")).unwrap_or(line);
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    SseLine::Data(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_prepends_carry_once() {
        let mut state = StreamState::new();
        state.hold("data: {\"par");
        assert_eq!(state.fold("tial\"}"), "data: {\"partial\"}");
        assert!(state.is_empty());
        assert_eq!(state.fold("next"), "next");
    }

    #[test]
    fn classify_strips_data_prefix() {
        assert_eq!(classify("data: {\"a\":1}"), SseLine::Data("{\"a\":1}"));
        assert_eq!(classify("data:{\"a\":1}"), SseLine::Data("{\"a\":1}"));
    }

    #[test]
    fn classify_skips_comments_and_events() {
        assert_eq!(classify(": keep-alive"), SseLine::Skip);
        assert_eq!(classify("event: message_stop"), SseLine::Skip);
        assert_eq!(classify(""), SseLine::Skip);
        assert_eq!(classify("\r"), SseLine::Skip);
    }

    #[test]
    fn classify_done_sentinel() {
        assert_eq!(classify("data: [DONE]"), SseLine::Done);
        assert_eq!(classify("data: [DONE] "), SseLine::Done);
    }
}
