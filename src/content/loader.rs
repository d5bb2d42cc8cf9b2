//! Content loader - collects posts and pages from the content directory

use glob::Pattern;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{FrontMatter, MarkdownRenderer, Page, RenderStatus};
use crate::error::{BuildError, Result};
use crate::Site;

/// Slug taken by the home page
const RESERVED_SLUG: &str = "index";

/// Everything found under the content directory, split by kind
#[derive(Debug, Default)]
pub struct Collection {
    /// Pages taking part in the index and categories
    pub posts: Vec<Page>,
    /// Standalone pages (`page: true`)
    pub pages: Vec<Page>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.posts.len() + self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.pages.is_empty()
    }

    /// Every page, posts first
    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.posts.iter().chain(self.pages.iter())
    }
}

/// Loads content from the content directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    renderer: MarkdownRenderer,
    ignore: Vec<Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let ignore = site
            .config
            .ignore
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| BuildError::Config {
                    path: site.config_path.clone().unwrap_or_default(),
                    reason: format!("bad ignore pattern `{}`: {}", p, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let renderer = MarkdownRenderer::with_options(site.config.markdown.allow_raw_html);
        Ok(Self {
            site,
            renderer,
            ignore,
        })
    }

    /// Load, parse and render every content file.
    ///
    /// The first invalid file aborts the whole load.
    pub fn load(&self) -> Result<Collection> {
        let content_dir = &self.site.content_dir;
        if !content_dir.exists() {
            tracing::warn!("Content directory {:?} does not exist", content_dir);
            return Ok(Collection::default());
        }

        let mut collection = Collection::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        let walker = WalkDir::new(content_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(|e| BuildError::IoRead {
                path: e.path().unwrap_or(content_dir).to_path_buf(),
                source: e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
            })?;

            let path = entry.path();
            if !entry.file_type().is_file() || !is_markdown_file(path) || self.is_ignored(path) {
                continue;
            }

            let Some(page) = self.load_page(path)? else {
                continue;
            };

            if page.slug == RESERVED_SLUG {
                return Err(BuildError::DuplicateSlug {
                    slug: page.slug,
                    first: "the home page".to_string(),
                    second: path.display().to_string(),
                });
            }
            if let Some(first) = seen.get(&page.slug) {
                return Err(BuildError::DuplicateSlug {
                    slug: page.slug,
                    first: first.display().to_string(),
                    second: path.display().to_string(),
                });
            }
            seen.insert(page.slug.clone(), path.to_path_buf());

            if page.is_page {
                collection.pages.push(page);
            } else {
                collection.posts.push(page);
            }
        }

        tracing::debug!(
            "Loaded {} posts and {} pages from {:?}",
            collection.posts.len(),
            collection.pages.len(),
            content_dir
        );
        Ok(collection)
    }

    /// Load a single file; whitespace-only files yield `None`
    fn load_page(&self, path: &Path) -> Result<Option<Page>> {
        let content = fs::read_to_string(path).map_err(|source| BuildError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;

        if content.trim().is_empty() {
            tracing::warn!("Skipping empty file {:?}", path);
            return Ok(None);
        }

        let Some(slug) = Page::slug_from_path(path) else {
            tracing::warn!("Skipping {:?}: no usable file name", path);
            return Ok(None);
        };

        let (fm, body) = FrontMatter::parse(&content).map_err(|e| e.at(path))?;
        let mut page = Page::from_front_matter(&fm, &slug, body).map_err(|e| e.at(path))?;
        page.source = path.to_path_buf();

        let fragment = self.renderer.render(&page.body);
        if let RenderStatus::Degraded(reasons) = &fragment.status {
            for reason in reasons {
                tracing::warn!("{}: {}", path.display(), reason);
            }
        }
        page.attach_html(fragment);

        Ok(Some(page))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return true;
        };
        self.ignore.iter().any(|p| p.matches(name))
    }
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}
