//! sitemap.xml and robots.txt

use crate::aggregate::Aggregates;
use crate::config::SiteConfig;
use crate::content::Page;
use crate::helpers::{full_url_for, html_escape};

use super::{article_path, category_path};

struct Entry {
    loc: String,
    lastmod: Option<String>,
    changefreq: &'static str,
    priority: &'static str,
}

/// Build the sitemap: home page, posts, static pages, then categories.
///
/// Pagination pages are left out; crawlers reach them through the links.
pub fn sitemap_xml(config: &SiteConfig, aggregates: &Aggregates, pages: &[Page]) -> String {
    let url = |path: &str| full_url_for(&config.site_url, &config.base_url, path);

    let mut entries = vec![Entry {
        loc: url(""),
        lastmod: aggregates.site_index.first().map(|p| p.date_str()),
        changefreq: "daily",
        priority: "1.0",
    }];

    entries.extend(aggregates.site_index.iter().map(|p| Entry {
        loc: url(&article_path(p)),
        lastmod: Some(p.date_str()),
        changefreq: "monthly",
        priority: "0.8",
    }));

    let mut static_pages: Vec<&Page> = pages.iter().collect();
    static_pages.sort_by(|a, b| a.slug.cmp(&b.slug));
    entries.extend(static_pages.into_iter().map(|p| Entry {
        loc: url(&article_path(p)),
        lastmod: p.date.map(|_| p.date_str()),
        changefreq: "yearly",
        priority: "0.6",
    }));

    entries.extend(aggregates.categories.values().map(|c| Entry {
        loc: url(&category_path(c, 1)),
        // Members are newest first
        lastmod: c.posts.first().map(|p| p.date_str()),
        changefreq: "weekly",
        priority: "0.4",
    }));

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in &entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", html_escape(&entry.loc)));
        if let Some(lastmod) = &entry.lastmod {
            xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        }
        xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
        xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");

    tracing::debug!("sitemap.xml: {} URLs", entries.len());
    xml
}

/// Build robots.txt from the `robots` section of the config
pub fn robots_txt(config: &SiteConfig) -> String {
    let robots = &config.robots;
    let mut lines: Vec<String> = robots.comments.iter().map(|c| format!("# {}", c)).collect();

    lines.push(format!("User-agent: {}", robots.user_agent));
    if robots.allow.is_empty() && robots.disallow.is_empty() {
        lines.push("Allow: /".to_string());
    }
    lines.extend(robots.allow.iter().map(|r| format!("Allow: {}", r)));
    lines.extend(robots.disallow.iter().map(|r| format!("Disallow: {}", r)));
    if let Some(delay) = robots.crawl_delay {
        lines.push(format!("Crawl-delay: {}", delay));
    }

    if robots.sitemap && !config.site_url.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "Sitemap: {}",
            full_url_for(&config.site_url, &config.base_url, "sitemap.xml")
        ));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}
