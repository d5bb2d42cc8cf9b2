//! HTML helper functions

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INLINE_CODE: Regex = Regex::new(r"`(.+?)`").unwrap();
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Truncate a string to `length` characters, appending `omission` when cut
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(length).collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}

/// Plain-text excerpt of a Markdown body: the first line that is neither
/// blank nor a heading, with inline-code backticks removed.
pub fn excerpt(markdown: &str, length: usize) -> String {
    let mut in_fence = false;
    for line in markdown.lines() {
        let t = line.trim();
        if t.starts_with("```") || t.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || t.is_empty() || t.starts_with('#') {
            continue;
        }
        let text = INLINE_CODE.replace_all(t, "$1");
        return truncate(&text, length, Some("…"));
    }
    String::new()
}
