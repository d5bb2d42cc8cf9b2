//! HTML and CSS minification

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Elements whose content is whitespace-sensitive or not HTML at all
    static ref PROTECTED: Regex = Regex::new(
        r"(?is)<pre\b.*?</pre>|<code\b.*?</code>|<textarea\b.*?</textarea>|<script\b.*?</script>|<style\b.*?</style>"
    )
    .unwrap();
    static ref BETWEEN_TAGS: Regex = Regex::new(r">\s+<").unwrap();

    static ref CSS_COMMENT: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref CSS_PUNCT: Regex = Regex::new(r"\s*([{};,>])\s*").unwrap();
    // Space before a colon can be a descendant combinator (`a :hover`)
    static ref CSS_COLON: Regex = Regex::new(r":\s+").unwrap();
    static ref CSS_LAST_SEMI: Regex = Regex::new(r";\s*}").unwrap();
    static ref CSS_SPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref CSS_LEADING_ZERO: Regex = Regex::new(r"(^|[^\d.])0\.(\d+)").unwrap();
    static ref CSS_ZERO_UNIT: Regex = Regex::new(r":0(?:px|em|rem|%)").unwrap();
}

/// Tags that never sit inline in running text
const BLOCK_TAGS: &[&str] = &[
    "html", "head", "body", "title", "meta", "link", "script", "style", "main", "header",
    "footer", "nav", "section", "article", "aside", "div", "p", "h1", "h2", "h3", "h4", "h5",
    "h6", "ul", "ol", "li", "dl", "dt", "dd", "pre", "blockquote", "table", "thead", "tbody",
    "tfoot", "tr", "th", "td", "figure", "figcaption", "hr", "br", "select", "option",
];

/// Collapse whitespace between tags, leaving protected elements untouched.
///
/// A gap next to a block-level tag is removed. A gap between two inline
/// tags (`<strong>a</strong> <em>b</em>`) separates words, so it shrinks to
/// one space.
pub fn minify_html(html: &str) -> String {
    let protected: Vec<(usize, usize)> = PROTECTED
        .find_iter(html)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for gap in BETWEEN_TAGS.find_iter(html) {
        // `>` and `<` are part of the match, the whitespace sits in between
        let (ws_start, ws_end) = (gap.start() + 1, gap.end() - 1);
        if protected
            .iter()
            .any(|&(start, end)| start < ws_start && ws_end < end)
        {
            continue;
        }

        out.push_str(&html[last..ws_start]);
        let before = tag_name(&html[html[..ws_start].rfind('<').unwrap_or(0)..ws_start]);
        let after = tag_name(&html[ws_end..]);
        if !(is_block(&before) || is_block(&after)) {
            out.push(' ');
        }
        last = ws_end;
    }
    out.push_str(&html[last..]);

    out.trim().to_string()
}

/// Lowercase element name of a tag starting at `<`; empty for doctypes and
/// comments
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_block(name: &str) -> bool {
    name.is_empty() || BLOCK_TAGS.contains(&name)
}

/// Strip comments and redundant whitespace from a stylesheet
pub fn minify_css(css: &str) -> String {
    let css = CSS_COMMENT.replace_all(css, "");
    let css = CSS_PUNCT.replace_all(&css, "$1");
    let css = CSS_COLON.replace_all(&css, ":");
    let css = CSS_LAST_SEMI.replace_all(&css, "}");
    let css = CSS_SPACE.replace_all(&css, " ");
    let css = CSS_LEADING_ZERO.replace_all(css.trim(), "${1}.${2}");
    CSS_ZERO_UNIT.replace_all(&css, ":0").into_owned()
}
