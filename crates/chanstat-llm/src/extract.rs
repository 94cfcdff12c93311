//! Recovery of JSON payloads from free-form model output.
//!
//! Models asked for JSON frequently wrap it in a markdown fence or surround
//! it with prose. Extraction tries, in order, stopping at the first success:
//!
//! 1. the whole trimmed text;
//! 2. the contents of the first code fence (```` ```json ```` or bare ```` ``` ````);
//! 3. every balanced `{…}` / `[…]` group, in order of where it starts.
//!
//! When nothing parses the caller gets `None` and a warning is logged with an
//! excerpt of the raw text.

use serde_json::Value;

/// Longest excerpt of a raw response kept for diagnostics.
pub const EXCERPT_MAX_CHARS: usize = 200;

const FENCE: &str = "```";

/// Never-failing JSON extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResilientExtractor;

impl ResilientExtractor {
    /// Returns the first JSON value found in `text`, or `None`.
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(value) = serde_json::from_str(trimmed) {
            return Some(value);
        }

        if let Some(fenced) = strip_code_fence(trimmed) {
            if let Ok(value) = serde_json::from_str(fenced) {
                tracing::debug!("parsed JSON from code fence");
                return Some(value);
            }
        }

        for candidate in bracketed_candidates(trimmed) {
            if let Ok(value) = serde_json::from_str(candidate) {
                tracing::debug!(candidate_len = candidate.len(), "parsed embedded JSON");
                return Some(value);
            }
        }

        tracing::warn!(
            response_length = text.len(),
            excerpt = %excerpt(text),
            "no JSON payload found in model response"
        );
        None
    }
}

/// At most [`EXCERPT_MAX_CHARS`] characters of `text`, cut on a char boundary.
#[must_use]
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_MAX_CHARS).collect()
}

/// Body of the first code fence. The info string (`json`, `JSON`, ...) is
/// dropped; an unclosed fence runs to the end of the text.
fn strip_code_fence(text: &str) -> Option<&str> {
    let start = text.find(FENCE)?;
    let after = &text[start + FENCE.len()..];

    let body = match after.find('\n') {
        Some(nl) if after[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            &after[nl + 1..]
        }
        _ => after
            .strip_prefix("json")
            .or_else(|| after.strip_prefix("JSON"))
            .unwrap_or(after),
    };

    let end = body.find(FENCE).unwrap_or(body.len());
    Some(body[..end].trim())
}

/// Every balanced bracket group in `text`, ordered by start position.
/// Groups nested inside an earlier one are yielded too, after it.
fn bracketed_candidates(text: &str) -> impl Iterator<Item = &str> {
    bracket_spans(text)
        .into_iter()
        .map(move |(start, end)| &text[start..end])
}

/// Byte ranges of balanced `{…}` / `[…]` groups, found in one pass.
///
/// Quotes only open a string inside a group, so prose apostrophes and
/// quotes before the payload do not hide it. A mismatched closer drops every
/// open group.
fn bracket_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Vec<(usize, char)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if !open.is_empty() => in_string = true,
            '{' => open.push((i, '}')),
            '[' => open.push((i, ']')),
            '}' | ']' => match open.pop() {
                Some((start, closer)) if closer == c => spans.push((start, i + 1)),
                _ => open.clear(),
            },
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
}
