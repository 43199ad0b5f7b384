//! Markdown fence stripping for model replies.

use std::sync::LazyLock;

use regex::Regex;

/// Word directly after an opening fence (```csv, ```text, ...).
static FENCE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_+\-]+)(?:\s|$)").unwrap());

const FENCE: &str = "```";

/// Words treated as a language tag. Anything else on the fence line is
/// content, e.g. a single-column header.
const LANGUAGE_TAGS: &[&str] = &[
    "csv", "tsv", "text", "txt", "plaintext", "markdown", "md", "json",
];

const BOM: char = '\u{feff}';

/// Remove a byte order mark, surrounding code fences, an opening
/// language tag, and surrounding whitespace.
///
/// Applied until nothing changes, so `strip_framing(strip_framing(x))`
/// always equals `strip_framing(x)`.
pub fn strip_framing(raw: &str) -> &str {
    let mut text = raw.trim();
    loop {
        let next = strip_once(text);
        if next.len() == text.len() {
            return text;
        }
        text = next;
    }
}

fn strip_once(text: &str) -> &str {
    let mut text = text.trim_start_matches(BOM).trim_start();

    if text.starts_with('`') {
        let opened_fence = text.starts_with(FENCE);
        text = text.trim_start_matches('`');
        if opened_fence {
            if let Some(tag) = FENCE_TAG
                .captures(text)
                .and_then(|c| c.get(1))
                .filter(|tag| is_language_tag(tag.as_str()))
            {
                text = &text[tag.end()..];
            }
        }
    }

    text.trim_end_matches('`').trim()
}

fn is_language_tag(word: &str) -> bool {
    LANGUAGE_TAGS.iter().any(|tag| tag.eq_ignore_ascii_case(word))
}
