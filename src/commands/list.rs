//! List site content

use anyhow::Result;

use crate::aggregate::aggregate;
use crate::content::ContentLoader;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    for line in lines(site, content_type)? {
        println!("{}", line);
    }
    Ok(())
}

/// The listing as text lines
pub fn lines(site: &Site, content_type: &str) -> Result<Vec<String>> {
    let collection = ContentLoader::new(site)?.load()?;
    let mut out = Vec::new();

    match content_type {
        "post" | "posts" => {
            let aggregates = aggregate(&collection.posts)?;
            out.push(format!("Posts ({}):", aggregates.site_index.len()));
            for post in &aggregates.site_index {
                out.push(format!(
                    "  {} - {} [{}]",
                    post.date_str(),
                    post.title,
                    post.source.display()
                ));
            }
        }
        "page" | "pages" => {
            let mut pages: Vec<_> = collection.pages.iter().collect();
            pages.sort_by(|a, b| a.title.cmp(&b.title));
            out.push(format!("Pages ({}):", pages.len()));
            for page in pages {
                out.push(format!("  {} [{}]", page.title, page.source.display()));
            }
        }
        "category" | "categories" => {
            let aggregates = aggregate(&collection.posts)?;
            out.push(format!("Categories ({}):", aggregates.categories.len()));
            for category in aggregates.categories.values() {
                out.push(format!("  {} ({})", category.name, category.posts.len()));
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, pages, categories",
                content_type
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("a.md"),
            "---\ntitle: A\ndate: 2024-01-02\ncategories: x\n---\n",
        )
        .unwrap();
        fs::write(
            content.join("b.md"),
            "---\ntitle: B\ndate: 2024-01-03\ncategories: x, y\n---\n",
        )
        .unwrap();
        fs::write(content.join("about.md"), "---\ntitle: About\npage: true\n---\n").unwrap();
        let site = Site::from_config(dir.path(), SiteConfig::default());
        (dir, site)
    }

    #[test]
    fn test_list_posts_newest_first() {
        let (_dir, site) = site();
        let lines = lines(&site, "posts").unwrap();
        assert_eq!(lines[0], "Posts (2):");
        assert!(lines[1].starts_with("  2024-01-03 - B ["));
        assert!(lines[2].starts_with("  2024-01-02 - A ["));
    }

    #[test]
    fn test_list_categories() {
        let (_dir, site) = site();
        assert_eq!(
            lines(&site, "categories").unwrap(),
            vec!["Categories (2):", "  x (2)", "  y (1)"]
        );
    }

    #[test]
    fn test_list_pages_and_unknown_type() {
        let (_dir, site) = site();
        assert_eq!(lines(&site, "page").unwrap()[0], "Pages (1):");
        assert!(lines(&site, "tags").is_err());
    }
}
