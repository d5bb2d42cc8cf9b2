//! Generator module - renders the whole site into memory using the built-in
//! Tera templates
//!
//! Nothing here touches the filesystem; [`crate::publish`] persists the
//! returned [`BuildOutput`].

mod sitemap;

pub use sitemap::{robots_txt, sitemap_xml};

use std::collections::BTreeMap;
use tera::Context;

use crate::aggregate::{Aggregates, Category};
use crate::budget::PageKind;
use crate::content::{highlight_css, Collection, Page};
use crate::error::Result;
use crate::helpers::{asset_url, minify_css, minify_html, url_for};
use crate::templates::{
    ArticleData, CardData, CategoryLink, LayoutData, NavLink, PaginationData, PresentationData,
    SocialLink, TemplateRenderer, BASE_CSS, BOOT_JS, NAV_JS,
};
use crate::Site;

/// Heading of the post listings on the home page
const INDEX_HEADING: &str = "All posts";

pub const HIGHLIGHT_LIGHT: &str = "highlight-light.css";
pub const HIGHLIGHT_DARK: &str = "highlight-dark.css";

/// A rendered HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: PageKind,
    /// Human-readable name for diagnostics
    pub name: String,
    pub html: String,
}

/// Every generated file, keyed by output-relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub documents: BTreeMap<String, Document>,
    /// Non-HTML files: stylesheets, sitemap, robots.txt
    pub resources: BTreeMap<String, String>,
}

impl BuildOutput {
    pub fn len(&self) -> usize {
        self.documents.len() + self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty() && self.resources.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.documents.contains_key(path) || self.resources.contains_key(path)
    }

    /// Content of a generated file
    pub fn get(&self, path: &str) -> Option<&str> {
        self.documents
            .get(path)
            .map(|d| d.html.as_str())
            .or_else(|| self.resources.get(path).map(String::as_str))
    }

    /// All files as `(path, content)`, documents first
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents
            .iter()
            .map(|(p, d)| (p.as_str(), d.html.as_str()))
            .chain(self.resources.iter().map(|(p, c)| (p.as_str(), c.as_str())))
    }
}

/// Static site generator using Tera templates
pub struct Generator<'a> {
    site: &'a Site,
    renderer: TemplateRenderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self> {
        Ok(Self {
            site,
            renderer: TemplateRenderer::new()?,
        })
    }

    /// Render every document and resource of the site
    pub fn generate(&self, collection: &Collection, aggregates: &Aggregates) -> Result<BuildOutput> {
        let layout = self.build_layout(&collection.pages, aggregates);
        let mut output = BuildOutput::default();

        self.generate_index_pages(&layout, aggregates, &mut output)?;
        self.generate_articles(&layout, collection, aggregates, &mut output)?;
        self.generate_category_pages(&layout, aggregates, &mut output)?;
        self.generate_resources(collection, aggregates, &mut output);

        tracing::debug!(
            "Rendered {} documents and {} resources",
            output.documents.len(),
            output.resources.len()
        );
        Ok(output)
    }

    /// Build data shared by every document
    fn build_layout(&self, pages: &[Page], aggregates: &Aggregates) -> LayoutData {
        let config = &self.site.config;
        let base = config.base_url.as_str();

        let mut nav = vec![NavLink {
            title: "Home".to_string(),
            url: url_for(base, "index.html"),
        }];
        let mut static_pages: Vec<&Page> = pages.iter().collect();
        static_pages.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.slug.cmp(&b.slug)));
        nav.extend(static_pages.into_iter().map(|p| NavLink {
            title: p.title.clone(),
            url: url_for(base, &article_path(p)),
        }));

        let categories = aggregates
            .categories
            .values()
            .map(|c| CategoryLink {
                name: c.name.clone(),
                url: url_for(base, &category_path(c, 1)),
            })
            .collect();

        let social = config
            .social
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(platform, url)| SocialLink {
                title: capitalize(platform),
                url: url.trim().to_string(),
                icon: url_for(base, &format!("icons/{}.svg", social_icon(platform))),
            })
            .collect();

        let mut style = BASE_CSS.to_string();
        if let Some(palette) = &config.palette {
            style.push_str(&palette.to_css("html[data-theme=light]"));
        }
        if let Some(palette) = &config.palette_dark {
            style.push_str(&palette.to_css("html[data-theme=dark]"));
        }

        LayoutData {
            title: config.title.clone(),
            lang: config.lang.clone(),
            home_url: url_for(base, "index.html"),
            favicon: asset_url(base, config.favicon.as_deref()),
            style: minify_css(&style),
            boot_js: BOOT_JS,
            nav_js: NAV_JS,
            highlight_light: url_for(base, HIGHLIGHT_LIGHT),
            highlight_dark: url_for(base, HIGHLIGHT_DARK),
            nav,
            categories,
            social,
        }
    }

    /// Create a base context with common variables
    fn create_base_context(
        &self,
        layout: &LayoutData,
        doc_title: &str,
        heading: &str,
        description: &str,
    ) -> Context {
        let mut context = Context::new();
        context.insert("site", layout);
        context.insert("doc_title", doc_title);
        context.insert("heading", heading);
        context.insert("description", description);
        context
    }

    /// Generate the home page and its pagination pages
    fn generate_index_pages(
        &self,
        layout: &LayoutData,
        aggregates: &Aggregates,
        output: &mut BuildOutput,
    ) -> Result<()> {
        let config = &self.site.config;
        let pages = paginate(&aggregates.site_index, config.per_page);
        let total = pages.len();
        let presentation = self.presentation();

        for (i, chunk) in pages.into_iter().enumerate() {
            let current = i + 1;
            let doc_title = if current == 1 {
                config.title.clone()
            } else {
                format!("{} · Page {}", config.title, current)
            };

            let mut context =
                self.create_base_context(layout, &doc_title, INDEX_HEADING, &config.description);
            context.insert("cards", &self.cards(chunk));
            context.insert(
                "pagination",
                &self.pagination(current, total, index_path),
            );
            // The presentation header only tops the first page
            context.insert(
                "presentation",
                &presentation.as_ref().filter(|_| current == 1),
            );

            let html = self.renderer.render("index.html", &context)?;
            let name = if current == 1 {
                "Home".to_string()
            } else {
                format!("Home (page {})", current)
            };
            self.push_document(output, index_path(current), PageKind::Index, name, html);
        }

        Ok(())
    }

    /// Generate one document per post and static page
    fn generate_articles(
        &self,
        layout: &LayoutData,
        collection: &Collection,
        aggregates: &Aggregates,
        output: &mut BuildOutput,
    ) -> Result<()> {
        let config = &self.site.config;
        let base = config.base_url.as_str();

        for page in collection.iter() {
            let categories = if page.is_post() {
                page.categories
                    .iter()
                    .filter_map(|name| aggregates.category(name))
                    .map(|c| CategoryLink {
                        name: c.name.clone(),
                        url: url_for(base, &category_path(c, 1)),
                    })
                    .collect()
            } else {
                Vec::new()
            };

            let thumbnail = if page.thumbnail_on_article {
                asset_url(base, page.thumbnail.as_deref())
            } else {
                None
            };

            let article = ArticleData {
                title: page.title.clone(),
                subtitle: page.subtitle.clone(),
                date: page.date_str(),
                author: page.author.clone(),
                min_read: page.min_read,
                categories,
                thumbnail,
                body: page.body_html().to_string(),
            };

            let doc_title = format!("{} - {}", page.title, config.title);
            let description = if page.excerpt.is_empty() {
                config.description.as_str()
            } else {
                page.excerpt.as_str()
            };

            let mut context =
                self.create_base_context(layout, &doc_title, &page.title, description);
            context.insert("article", &article);

            let template = if page.is_page { "page.html" } else { "post.html" };
            let html = self.renderer.render(template, &context)?;
            self.push_document(
                output,
                article_path(page),
                PageKind::Article,
                page.title.clone(),
                html,
            );
        }

        Ok(())
    }

    /// Generate the listing pages of every category
    fn generate_category_pages(
        &self,
        layout: &LayoutData,
        aggregates: &Aggregates,
        output: &mut BuildOutput,
    ) -> Result<()> {
        let config = &self.site.config;

        for category in aggregates.categories.values() {
            let pages = paginate(&category.posts, config.per_page);
            let total = pages.len();
            let heading = format!("Category · {}", category.name);

            for (i, chunk) in pages.into_iter().enumerate() {
                let current = i + 1;
                let doc_title = if current == 1 {
                    format!("{} - {}", heading, config.title)
                } else {
                    format!("{} · Page {} - {}", heading, current, config.title)
                };

                let mut context =
                    self.create_base_context(layout, &doc_title, &heading, &config.description);
                context.insert("cards", &self.cards(chunk));
                context.insert(
                    "pagination",
                    &self.pagination(current, total, |n| category_path(category, n)),
                );

                let html = self.renderer.render("category.html", &context)?;
                let name = if current == 1 {
                    heading.clone()
                } else {
                    format!("{} (page {})", heading, current)
                };
                self.push_document(
                    output,
                    category_path(category, current),
                    PageKind::Other,
                    name,
                    html,
                );
            }
        }

        Ok(())
    }

    /// Highlight stylesheets, sitemap and robots.txt
    fn generate_resources(
        &self,
        collection: &Collection,
        aggregates: &Aggregates,
        output: &mut BuildOutput,
    ) {
        let config = &self.site.config;

        for (path, theme) in [
            (HIGHLIGHT_LIGHT, &config.markdown.highlight_light),
            (HIGHLIGHT_DARK, &config.markdown.highlight_dark),
        ] {
            let css = highlight_css(theme).unwrap_or_else(|| {
                tracing::warn!("Unknown highlight theme `{}`, writing an empty {}", theme, path);
                String::new()
            });
            let css = if config.minify { minify_css(&css) } else { css };
            output.resources.insert(path.to_string(), css);
        }

        if config.site_url.is_empty() {
            tracing::debug!("No site_url configured, skipping sitemap.xml");
        } else {
            output.resources.insert(
                "sitemap.xml".to_string(),
                sitemap_xml(config, aggregates, &collection.pages),
            );
        }

        output
            .resources
            .insert("robots.txt".to_string(), robots_txt(config));
    }

    fn push_document(
        &self,
        output: &mut BuildOutput,
        path: String,
        kind: PageKind,
        name: String,
        html: String,
    ) {
        let html = if self.site.config.minify {
            minify_html(&html)
        } else {
            html
        };
        tracing::debug!("Rendered: {} ({} bytes)", path, html.len());
        output.documents.insert(path, Document { kind, name, html });
    }

    fn presentation(&self) -> Option<PresentationData> {
        let config = &self.site.config.presentation;
        if !config.enabled {
            return None;
        }
        let photo = asset_url(&self.site.config.base_url, config.photo.as_deref());
        if config.title.trim().is_empty() && config.text.trim().is_empty() && photo.is_none() {
            return None;
        }
        Some(PresentationData {
            title: config.title.trim().to_string(),
            text: config.text.trim().to_string(),
            photo,
        })
    }

    /// Listing cards for a slice of posts
    fn cards(&self, posts: &[&Page]) -> Vec<CardData> {
        let config = &self.site.config;
        let base = config.base_url.as_str();
        let default_thumbnail = asset_url(base, config.default_thumbnail.as_deref());

        posts
            .iter()
            .map(|p| CardData {
                title: p.title.clone(),
                subtitle: p.subtitle.clone(),
                url: url_for(base, &article_path(p)),
                date: p.date_str(),
                author: p.author.clone(),
                min_read: p.min_read,
                categories: p.categories.clone(),
                thumbnail: asset_url(base, p.thumbnail.as_deref())
                    .or_else(|| default_thumbnail.clone()),
            })
            .collect()
    }

    fn pagination(
        &self,
        current: usize,
        total: usize,
        path_of: impl Fn(usize) -> String,
    ) -> PaginationData {
        let base = self.site.config.base_url.as_str();
        PaginationData {
            current,
            total,
            prev_link: (current > 1).then(|| url_for(base, &path_of(current - 1))),
            next_link: (current < total).then(|| url_for(base, &path_of(current + 1))),
        }
    }
}

/// Split items into pages of `per_page`; `0` keeps everything on one page.
/// There is always at least one page, possibly empty.
pub fn paginate<T>(items: &[T], per_page: usize) -> Vec<&[T]> {
    if per_page == 0 || items.is_empty() {
        return vec![items];
    }
    items.chunks(per_page).collect()
}

/// Output path of home page `n` (1-based)
pub fn index_path(n: usize) -> String {
    if n <= 1 {
        "index.html".to_string()
    } else {
        format!("page/{}.html", n)
    }
}

/// Output path of a post or static page
pub fn article_path(page: &Page) -> String {
    format!("{}.html", page.slug)
}

/// Output path of category listing page `n` (1-based)
pub fn category_path(category: &Category, n: usize) -> String {
    if n <= 1 {
        format!("category/{}.html", category.slug)
    } else {
        format!("category/{}/{}.html", category.slug, n)
    }
}

/// Icon file name for a social platform
fn social_icon(platform: &str) -> String {
    match platform.to_lowercase().as_str() {
        "x" => "twitter-x".to_string(),
        other => other.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
