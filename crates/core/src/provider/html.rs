//! Plain-text cleanup for HTML descriptions.

use once_cell::sync::Lazy;
use regex::Regex;

static BREAK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|h[1-6])\s*>").expect("invalid break regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("invalid tag regex"));
static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("invalid blank line regex"));

const ENTITIES: [(&str, &str); 6] = [
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Strip tags from `input`, turning block ends and line breaks into newlines.
pub fn strip_html(input: &str) -> String {
    if !input.contains('<') && !input.contains('&') {
        return input.trim().to_string();
    }

    let with_breaks = BREAK_RE.replace_all(input, "\n");
    let mut text = TAG_RE.replace_all(&with_breaks, "").into_owned();
    // `&amp;` last so already-escaped entities are not decoded twice.
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }
    BLANK_LINES_RE
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}
