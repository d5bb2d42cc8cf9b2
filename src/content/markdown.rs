//! Markdown rendering with syntax highlighting
//!
//! Rendering never fails. Anything the renderer cannot represent faithfully
//! is emitted as literal text and recorded on the returned [`Fragment`] as a
//! [`Degradation`], so callers can report it without inspecting the HTML.

use pulldown_cmark::{
    html, BrokenLink, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd,
};
use std::fmt;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::helpers::html_escape;

/// Highlighted tokens are emitted as `hl-*` classes so light and dark
/// stylesheets can be swapped on the client.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Why part of a body was rendered as literal text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// Raw HTML was escaped instead of passed through
    RawHtml,
    /// A fenced block names a language without a syntax definition
    UnknownLanguage(String),
    /// A reference-style link points at an undefined label
    BrokenReference(String),
    /// The highlighter failed on a block
    Highlight(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawHtml => write!(f, "raw HTML rendered as text"),
            Self::UnknownLanguage(lang) => write!(f, "no syntax definition for `{}`", lang),
            Self::BrokenReference(label) => write!(f, "undefined link reference `{}`", label),
            Self::Highlight(msg) => write!(f, "highlighting failed: {}", msg),
        }
    }
}

/// Outcome of rendering one body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    Rendered,
    Degraded(Vec<Degradation>),
}

impl RenderStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// A rendered HTML fragment and how faithfully it was rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub html: String,
    pub status: RenderStatus,
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    allow_raw_html: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(false)
    }

    /// Create with custom settings
    pub fn with_options(allow_raw_html: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            allow_raw_html,
        }
    }

    /// Render markdown to an HTML fragment
    pub fn render(&self, markdown: &str) -> Fragment {
        // Front matter is stripped before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES;

        let mut broken = Vec::new();
        let parsed: Vec<Event> = Parser::new_with_broken_link_callback(
            markdown,
            options,
            Some(record_broken_links(&mut broken)),
        )
        .collect();

        let mut degradations: Vec<Degradation> = broken
            .into_iter()
            .map(Degradation::BrokenReference)
            .collect();

        let mut events: Vec<Event> = Vec::with_capacity(parsed.len());
        let mut code_block: Option<(Option<String>, String)> = None;

        for event in parsed {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => fence_language(&info),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = code_block.take() {
                        let highlighted =
                            self.highlight_code(&code, lang.as_deref(), &mut degradations);
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some((_, code)) = code_block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::Html(raw) | Event::InlineHtml(raw) if !self.allow_raw_html => {
                    if !degradations.contains(&Degradation::RawHtml) {
                        degradations.push(Degradation::RawHtml);
                    }
                    events.push(Event::Text(raw));
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        let status = if degradations.is_empty() {
            RenderStatus::Rendered
        } else {
            RenderStatus::Degraded(degradations)
        };

        Fragment {
            html: html_output,
            status,
        }
    }

    /// Highlight a code block
    fn highlight_code(
        &self,
        code: &str,
        lang: Option<&str>,
        degradations: &mut Vec<Degradation>,
    ) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", html_escape(code));
        };
        let plain = || {
            format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                html_escape(lang),
                html_escape(code)
            )
        };

        let Some(syntax) = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
        else {
            degradations.push(Degradation::UnknownLanguage(lang.to_string()));
            return plain();
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                degradations.push(Degradation::Highlight(e.to_string()));
                return plain();
            }
        }

        format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            html_escape(lang),
            generator.finalize()
        )
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Broken-link callback that records reference labels and leaves the link
/// as literal text. Bare `[shortcut]` brackets are too common in prose to
/// count as broken.
fn record_broken_links<'input, 'a>(
    seen: &'a mut Vec<String>,
) -> impl FnMut(BrokenLink<'input>) -> Option<(CowStr<'input>, CowStr<'input>)> + 'a {
    move |link| {
        let label = link.reference.to_string();
        if !matches!(link.link_type, LinkType::Shortcut | LinkType::ShortcutUnknown)
            && !seen.contains(&label)
        {
            seen.push(label);
        }
        None
    }
}

/// Language token of a fence info string (`rust,ignore` and `rust title=x`
/// both give `rust`)
fn fence_language(info: &str) -> Option<String> {
    let lang = info
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase();
    if lang.is_empty() {
        None
    } else {
        Some(lang)
    }
}

/// Stylesheet for the highlight classes of a bundled syntect theme
pub fn highlight_css(theme: &str) -> Option<String> {
    let themes = ThemeSet::load_defaults();
    let theme = themes.themes.get(theme)?;
    css_for_theme_with_class_style(theme, CLASS_STYLE).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("# Hello World\n\nThis is a *test*.");
        assert!(fragment.html.contains("<h1>Hello World</h1>"));
        assert!(fragment.html.contains("<p>This is a <em>test</em>.</p>"));
        assert_eq!(fragment.status, RenderStatus::Rendered);
    }

    #[test]
    fn test_render_table_and_list() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n\n- one\n- two\n");
        assert!(fragment.html.contains("<table>"));
        assert!(fragment.html.contains("<li>two</li>"));
    }

    #[test]
    fn test_render_code_block_with_classes() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("```rust\nfn main() {}\n```");
        assert!(fragment.html.contains(r#"<pre><code class="language-rust">"#));
        assert!(fragment.html.contains("hl-"));
        assert_eq!(fragment.status, RenderStatus::Rendered);
    }

    #[test]
    fn test_unknown_language_degrades() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("```nosuchlang\n<tag> & stuff\n```");
        assert!(fragment
            .html
            .contains(r#"<code class="language-nosuchlang">&lt;tag&gt; &amp; stuff"#));
        assert_eq!(
            fragment.status,
            RenderStatus::Degraded(vec![Degradation::UnknownLanguage("nosuchlang".into())])
        );
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("Hi <script>alert(1)</script> there");
        assert!(!fragment.html.contains("<script>"));
        assert!(fragment.html.contains("&lt;script&gt;"));
        assert_eq!(
            fragment.status,
            RenderStatus::Degraded(vec![Degradation::RawHtml])
        );
    }

    #[test]
    fn test_raw_html_allowed() {
        let renderer = MarkdownRenderer::with_options(true);
        let fragment = renderer.render("<div class=\"note\">kept</div>\n");
        assert!(fragment.html.contains("<div class=\"note\">kept</div>"));
        assert_eq!(fragment.status, RenderStatus::Rendered);
    }

    #[test]
    fn test_broken_reference_degrades() {
        let renderer = MarkdownRenderer::new();
        let fragment = renderer.render("See [the docs][missing] and array[0].");
        assert!(fragment.html.contains("[the docs][missing]"));
        assert_eq!(
            fragment.status,
            RenderStatus::Degraded(vec![Degradation::BrokenReference("missing".into())])
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = MarkdownRenderer::new();
        let md = "# T\n\n```python\nprint('x')\n```\n\n| a |\n|---|\n| b |\n";
        assert_eq!(renderer.render(md), renderer.render(md));
        assert_eq!(renderer.render(md), MarkdownRenderer::new().render(md));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust,ignore"), Some("rust".into()));
        assert_eq!(fence_language("Python title=x"), Some("python".into()));
        assert_eq!(fence_language("  "), None);
    }

    #[test]
    fn test_highlight_css() {
        let css = highlight_css("InspiredGitHub").unwrap();
        assert!(css.contains(".hl-"));
        assert!(highlight_css("no-such-theme").is_none());
    }
}
