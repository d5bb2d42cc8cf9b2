//! Page model: one content unit built from front matter and a body

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::markdown::{Fragment, RenderStatus};
use super::FrontMatter;
use crate::error::{BuildError, Result};
use crate::helpers::excerpt;

/// Date format accepted for the `date` field
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length of the plain-text excerpt, in characters
const EXCERPT_LENGTH: usize = 160;

/// A post or a static page
#[derive(Debug, Clone)]
pub struct Page {
    /// Lowercased file stem; unique across the site
    pub slug: String,

    pub title: String,
    pub subtitle: Option<String>,

    /// Required for posts, optional for static pages
    pub date: Option<NaiveDate>,

    /// Trimmed, lowercased, de-duplicated, in source order
    pub categories: Vec<String>,

    /// `page: true` in front matter; static pages skip the index and categories
    pub is_page: bool,

    pub min_read: Option<u32>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub thumbnail_on_article: bool,

    /// Raw Markdown body
    pub body: String,

    /// First line of prose, used as the meta description
    pub excerpt: String,

    /// Source file path
    pub source: PathBuf,

    body_html: Option<Fragment>,
}

impl Page {
    /// Build a page from parsed front matter.
    ///
    /// Errors carry an empty path; the collector attaches the source file.
    pub fn from_front_matter(fm: &FrontMatter, slug: &str, body: &str) -> Result<Self> {
        let title = fm
            .get("title")
            .ok_or_else(|| missing("title"))?
            .to_string();

        let is_page = parse_flag("page", fm.get("page"), slug);

        let date = match fm.get("date") {
            Some(value) => Some(parse_date(value)?),
            None if is_page => None,
            None => return Err(missing("date")),
        };

        let min_read = fm.get("min_read").and_then(|value| match value.parse::<u32>() {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                tracing::warn!("{}: ignoring non-numeric min_read `{}`", slug, value);
                None
            }
        });

        for key in fm.keys() {
            if !KNOWN_FIELDS.contains(&key) {
                tracing::debug!("Ignoring unknown front-matter field `{}` in {}", key, slug);
            }
        }

        Ok(Self {
            slug: slug.to_string(),
            title,
            subtitle: fm.get("subtitle").map(str::to_string),
            date,
            categories: fm.get("categories").map(parse_categories).unwrap_or_default(),
            is_page,
            min_read,
            author: fm.get("author").map(str::to_string),
            thumbnail: fm.get("thumbnail").map(str::to_string),
            thumbnail_on_article: parse_flag(
                "thumbnail_on_article",
                fm.get("thumbnail_on_article"),
                slug,
            ),
            body: body.to_string(),
            excerpt: excerpt(body, EXCERPT_LENGTH),
            source: PathBuf::new(),
            body_html: None,
        })
    }

    /// Derive a slug from a file name: the stem, lowercased.
    pub fn slug_from_path(path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?.trim().to_lowercase();
        if stem.is_empty() {
            None
        } else {
            Some(stem)
        }
    }

    pub fn is_post(&self) -> bool {
        !self.is_page
    }

    /// `YYYY-MM-DD`, or an empty string for undated pages
    pub fn date_str(&self) -> String {
        self.date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Attach the rendered body. A page is rendered exactly once.
    pub fn attach_html(&mut self, fragment: Fragment) {
        debug_assert!(self.body_html.is_none(), "{} rendered twice", self.slug);
        self.body_html = Some(fragment);
    }

    /// Rendered body, empty until [`Page::attach_html`] has run
    pub fn body_html(&self) -> &str {
        self.body_html
            .as_ref()
            .map(|f| f.html.as_str())
            .unwrap_or("")
    }

    pub fn render_status(&self) -> Option<&RenderStatus> {
        self.body_html.as_ref().map(|f| &f.status)
    }

    /// Recognised fields as front matter, the inverse of
    /// [`Page::from_front_matter`] up to category normalisation.
    pub fn front_matter(&self) -> FrontMatter {
        let mut fm = FrontMatter::default();
        fm.insert("title", self.title.as_str());
        if let Some(subtitle) = &self.subtitle {
            fm.insert("subtitle", subtitle.as_str());
        }
        if self.date.is_some() {
            fm.insert("date", self.date_str());
        }
        if !self.categories.is_empty() {
            fm.insert("categories", self.categories.join(", "));
        }
        if let Some(min_read) = self.min_read {
            fm.insert("min_read", min_read.to_string());
        }
        if let Some(author) = &self.author {
            fm.insert("author", author.as_str());
        }
        if let Some(thumbnail) = &self.thumbnail {
            fm.insert("thumbnail", thumbnail.as_str());
        }
        if self.thumbnail_on_article {
            fm.insert("thumbnail_on_article", "true");
        }
        if self.is_page {
            fm.insert("page", "true");
        }
        fm
    }
}

const KNOWN_FIELDS: &[&str] = &[
    "title",
    "subtitle",
    "date",
    "categories",
    "min_read",
    "author",
    "thumbnail",
    "thumbnail_on_article",
    "page",
];

fn missing(field: &'static str) -> BuildError {
    BuildError::MissingRequiredField {
        path: PathBuf::new(),
        field,
    }
}

/// Parse a strict `YYYY-MM-DD` date
fn parse_date(value: &str) -> Result<NaiveDate> {
    let well_formed = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    well_formed
        .then(|| NaiveDate::parse_from_str(value, DATE_FORMAT).ok())
        .flatten()
        .ok_or_else(|| BuildError::InvalidDate {
            path: PathBuf::new(),
            value: value.to_string(),
        })
}

/// Boolean front-matter flag. `about` and `page` count as true so
/// `page: about` marks a static page; anything unrecognised is false.
fn parse_flag(field: &str, value: Option<&str>, slug: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "about" | "page" => true,
        "false" | "no" | "0" | "" => false,
        _ => {
            tracing::warn!("{}: treating `{}: {}` as false", slug, field, value);
            false
        }
    }
}

/// Split a comma-separated category list
pub fn parse_categories(value: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for token in value.split(',') {
        let token = token.trim().to_lowercase();
        if !token.is_empty() && !categories.contains(&token) {
            categories.push(token);
        }
    }
    categories
}
