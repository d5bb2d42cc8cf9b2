//! Built-in theme templates using the Tera template engine
//!
//! Templates, the base stylesheet and the theme scripts are embedded in the
//! binary; a site only supplies content, configuration and static files.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::content::DATE_FORMAT;
use crate::error::Result;
use crate::helpers::html_escape;

/// Stylesheet inlined into every document, before palette overrides
pub const BASE_CSS: &str = include_str!("theme/base.css");

/// Runs in `<head>`: restores the stored theme before first paint
pub const BOOT_JS: &str = include_str!("theme/boot.js");

/// Theme toggle, mobile menu and category selector
pub const NAV_JS: &str = include_str!("theme/nav.js");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Bodies arrive as rendered HTML; text fields go through `esc`
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("category.html", include_str!("theme/category.html")),
            ("post.html", include_str!("theme/post.html")),
            ("page.html", include_str!("theme/page.html")),
            // Partials
            ("partials/nav.html", include_str!("theme/partials/nav.html")),
            (
                "partials/postlist.html",
                include_str!("theme/partials/postlist.html"),
            ),
            (
                "partials/pager.html",
                include_str!("theme/partials/pager.html"),
            ),
        ])?;

        tera.register_filter("esc", esc_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape HTML special characters
fn esc_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let s = match value {
        tera::Value::String(s) => s.clone(),
        tera::Value::Null => String::new(),
        other => other.to_string(),
    };
    Ok(tera::Value::String(html_escape(&s)))
}

/// Tera filter: format a `YYYY-MM-DD` date
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    // "LL" is the long form, e.g. "May 30, 2023"
    if format == "LL" {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, DATE_FORMAT) {
            return Ok(tera::Value::String(date.format("%B %-d, %Y").to_string()));
        }
    }

    Ok(tera::Value::String(s))
}

/// Data structures for template context

/// Everything shared by all documents of a build
#[derive(Debug, Clone, Serialize)]
pub struct LayoutData {
    pub title: String,
    pub lang: String,
    pub home_url: String,
    pub favicon: Option<String>,
    /// Minified base stylesheet plus palette overrides
    pub style: String,
    pub boot_js: &'static str,
    pub nav_js: &'static str,
    pub highlight_light: String,
    pub highlight_dark: String,
    pub nav: Vec<NavLink>,
    pub categories: Vec<CategoryLink>,
    pub social: Vec<SocialLink>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialLink {
    pub title: String,
    pub url: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresentationData {
    pub title: String,
    pub text: String,
    pub photo: Option<String>,
}

/// One entry of a post listing
#[derive(Debug, Clone, Serialize)]
pub struct CardData {
    pub title: String,
    pub subtitle: Option<String>,
    pub url: String,
    pub date: String,
    pub author: Option<String>,
    pub min_read: Option<u32>,
    pub categories: Vec<String>,
    pub thumbnail: Option<String>,
}

/// A post or static page body with its header metadata
#[derive(Debug, Clone, Serialize)]
pub struct ArticleData {
    pub title: String,
    pub subtitle: Option<String>,
    pub date: String,
    pub author: Option<String>,
    pub min_read: Option<u32>,
    pub categories: Vec<CategoryLink>,
    pub thumbnail: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub current: usize,
    pub total: usize,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> LayoutData {
        LayoutData {
            title: "Site & Co".to_string(),
            lang: "en".to_string(),
            home_url: "/index.html".to_string(),
            favicon: None,
            style: ":root{--bg:#fff}".to_string(),
            boot_js: BOOT_JS,
            nav_js: NAV_JS,
            highlight_light: "/highlight-light.css".to_string(),
            highlight_dark: "/highlight-dark.css".to_string(),
            nav: vec![NavLink {
                title: "Home".to_string(),
                url: "/index.html".to_string(),
            }],
            categories: vec![CategoryLink {
                name: "rust".to_string(),
                url: "/category/rust.html".to_string(),
            }],
            social: Vec::new(),
        }
    }

    fn page_context(body: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &layout());
        context.insert("doc_title", "About - Site & Co");
        context.insert("description", "");
        context.insert("heading", "About");
        context.insert(
            "article",
            &ArticleData {
                title: "About <me>".to_string(),
                subtitle: None,
                date: String::new(),
                author: None,
                min_read: None,
                categories: Vec::new(),
                thumbnail: None,
                body: body.to_string(),
            },
        );
        context
    }

    #[test]
    fn test_render_page_is_complete_document() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer
            .render("page.html", &page_context("<p>Body</p>"))
            .unwrap();

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("<title>About - Site &amp; Co</title>"));
        assert!(html.contains("<h1>About &lt;me&gt;</h1>"));
        assert!(html.contains("<p>Body</p>"));
        assert!(html.contains(r#"id="themeToggle""#));
        assert!(html.contains(r#"<option value="/category/rust.html">rust</option>"#));
        assert!(html.contains("</body>"));
    }

    #[test]
    fn test_pager_hidden_for_single_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("site", &layout());
        context.insert("doc_title", "Category · rust");
        context.insert("description", "");
        context.insert("heading", "Category · rust");
        context.insert("cards", &Vec::<CardData>::new());
        context.insert(
            "pagination",
            &PaginationData {
                current: 1,
                total: 1,
                prev_link: None,
                next_link: None,
            },
        );
        let html = renderer.render("category.html", &context).unwrap();
        assert!(html.contains(r#"<ol class="postlist">"#));
        assert!(!html.contains(r#"class="pager""#));
    }

    #[test]
    fn test_filters() {
        let value = esc_filter(&tera::Value::String("<a&b>".into()), &HashMap::new()).unwrap();
        assert_eq!(value, tera::Value::String("&lt;a&amp;b&gt;".into()));

        let mut args = HashMap::new();
        args.insert("format".to_string(), tera::Value::String("LL".into()));
        let value = date_format_filter(&tera::Value::String("2023-05-03".into()), &args).unwrap();
        assert_eq!(value, tera::Value::String("May 3, 2023".into()));
    }
}
