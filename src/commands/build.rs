//! Build the site: collect, aggregate, render, check budgets, publish

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::aggregate::aggregate;
use crate::budget::{self, BudgetWarning};
use crate::content::{ContentLoader, RenderStatus};
use crate::generator::{BuildOutput, Generator};
use crate::publish::Publisher;
use crate::Site;

/// A page whose body was only partly rendered
#[derive(Debug, Clone, Serialize)]
pub struct DegradedPage {
    pub slug: String,
    pub source: PathBuf,
    pub reasons: Vec<String>,
}

/// Summary of one build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub posts: usize,
    pub pages: usize,
    pub categories: usize,
    pub documents: usize,
    pub resources: usize,
    /// Static files copied into the output
    pub copied: usize,
    pub out_dir: PathBuf,
    pub warnings: Vec<BudgetWarning>,
    pub degraded: Vec<DegradedPage>,
    pub elapsed_ms: u64,
}

/// Run the pipeline up to the in-memory output. Nothing is written.
pub fn render(site: &Site) -> crate::error::Result<(BuildOutput, BuildReport)> {
    let collection = ContentLoader::new(site)?.load()?;
    let aggregates = aggregate(&collection.posts)?;
    let output = Generator::new(site)?.generate(&collection, &aggregates)?;
    let warnings = budget::validate(&output, &site.config.budget);

    let degraded = collection
        .iter()
        .filter_map(|page| match page.render_status() {
            Some(RenderStatus::Degraded(reasons)) => Some(DegradedPage {
                slug: page.slug.clone(),
                source: page.source.clone(),
                reasons: reasons.iter().map(ToString::to_string).collect(),
            }),
            _ => None,
        })
        .collect();

    let report = BuildReport {
        posts: collection.posts.len(),
        pages: collection.pages.len(),
        categories: aggregates.categories.len(),
        documents: output.documents.len(),
        resources: output.resources.len(),
        warnings,
        degraded,
        ..BuildReport::default()
    };
    Ok((output, report))
}

/// Build and publish the site
pub fn run(site: &Site, out_dir: Option<PathBuf>) -> Result<BuildReport> {
    let start = Instant::now();

    let (output, mut report) = render(site).context("Build failed")?;

    let publisher = match out_dir {
        Some(dir) => Publisher::with_output(site, dir),
        None => Publisher::new(site),
    };
    let stats = publisher
        .publish(&output)
        .with_context(|| format!("Failed to publish to {:?}", publisher.out_dir()))?;

    report.copied = stats.copied;
    report.out_dir = publisher.out_dir().to_path_buf();
    report.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    tracing::info!(
        "Generated {} posts, {} pages, {} categories ({} files) in {}ms",
        report.posts,
        report.pages,
        report.categories,
        stats.written,
        report.elapsed_ms
    );
    if !report.warnings.is_empty() {
        tracing::warn!("{} page(s) over their size budget", report.warnings.len());
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::PageKind;
    use crate::error::BuildError;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn write(root: &Path, path: &str, text: &str) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn blog() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "site.yml",
            "title: Test Blog\nsite_url: https://example.com\n",
        );
        write(
            root,
            "content/a.md",
            "---\ntitle: A\ndate: 2024-01-02\ncategories: x\n---\n# Hello\n\nFirst post.\n",
        );
        write(
            root,
            "content/b.md",
            "---\ntitle: B\ndate: 2024-01-01\ncategories: x, y\n---\n```rust\nfn main() {}\n```\n",
        );
        write(
            root,
            "content/about.md",
            "---\ntitle: About\npage: true\n---\nAbout me.\n",
        );
        write(root, "public/img/logo.svg", "<svg/>");
        dir
    }

    fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().to_string();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_build_site() {
        let dir = blog();
        let site = Site::new(dir.path()).unwrap();
        let report = run(&site, None).unwrap();

        assert_eq!(report.posts, 2);
        assert_eq!(report.pages, 1);
        assert_eq!(report.categories, 2);
        assert_eq!(report.copied, 1);
        assert!(report.warnings.is_empty());
        assert!(report.degraded.is_empty());

        let out = dir.path().join("build");
        for path in [
            "index.html",
            "a.html",
            "b.html",
            "about.html",
            "category/x.html",
            "category/y.html",
            "img/logo.svg",
            "sitemap.xml",
            "robots.txt",
            "highlight-light.css",
            "highlight-dark.css",
        ] {
            assert!(out.join(path).exists(), "missing {}", path);
        }

        let about = fs::read_to_string(out.join("about.html")).unwrap();
        assert!(about.contains("About me."));
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.find("/a.html").unwrap() < index.find("/b.html").unwrap());
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let dir = blog();
        let site = Site::new(dir.path()).unwrap();

        run(&site, None).unwrap();
        let first = read_tree(&site.output_dir);
        run(&site, None).unwrap();
        let second = read_tree(&site.output_dir);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_post_without_date_fails() {
        let dir = blog();
        write(dir.path(), "content/nodate.md", "---\ntitle: No date\n---\nbody\n");
        let site = Site::new(dir.path()).unwrap();

        let err = render(&site).unwrap_err();
        match err {
            BuildError::MissingRequiredField { path, field } => {
                assert_eq!(field, "date");
                assert!(path.ends_with("nodate.md"));
            }
            other => panic!("unexpected error: {}", other),
        }

        // Nothing is published by a failed build
        assert!(run(&site, None).is_err());
        assert!(!site.output_dir.exists());
    }

    #[test]
    fn test_duplicate_slugs_fail() {
        let dir = blog();
        write(
            dir.path(),
            "content/old/a.md",
            "---\ntitle: Other A\ndate: 2020-01-01\n---\n",
        );
        let site = Site::new(dir.path()).unwrap();
        let err = render(&site).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateSlug { ref slug, .. } if slug == "a"));
    }

    #[test]
    fn test_loose_front_matter_values_build() {
        let dir = blog();
        write(
            dir.path(),
            "content/about.md",
            "---\ntitle: About\npage: about\n---\nAbout me.\n",
        );
        write(
            dir.path(),
            "content/a.md",
            "---\ntitle: A\ndate: 2024-01-02\nmin_read: 5 min\n---\nFirst post.\n",
        );
        let site = Site::new(dir.path()).unwrap();
        let report = run(&site, None).unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.posts, 2);
        let a = fs::read_to_string(site.output_dir.join("a.html")).unwrap();
        assert!(!a.contains("min read"));
    }

    #[test]
    fn test_oversized_index_is_published_with_one_warning() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "site.yml", "per_page: 0\n");
        for i in 0..60 {
            write(
                dir.path(),
                &format!("content/post-{:02}.md", i),
                &format!(
                    "---\ntitle: A fairly long post title number {:02} to fill the index\ndate: 2024-01-01\n---\nShort body.\n",
                    i
                ),
            );
        }
        let site = Site::new(dir.path()).unwrap();
        let report = run(&site, None).unwrap();

        assert_eq!(report.warnings.len(), 1);
        let warning = &report.warnings[0];
        assert_eq!(warning.kind, PageKind::Index);
        assert_eq!(warning.path, "index.html");
        assert_eq!(warning.limit, 14 * 1024);

        let published = fs::read(site.output_dir.join("index.html")).unwrap();
        assert_eq!(published.len(), warning.size);
        assert!(published.len() > 14 * 1024);
    }

    #[test]
    fn test_degraded_pages_are_reported() {
        let dir = blog();
        write(
            dir.path(),
            "content/raw.md",
            "---\ntitle: Raw\ndate: 2024-02-01\n---\n<div>raw</div>\n",
        );
        let site = Site::new(dir.path()).unwrap();
        let (_, report) = render(&site).unwrap();

        assert_eq!(report.degraded.len(), 1);
        assert_eq!(report.degraded[0].slug, "raw");
        assert_eq!(report.degraded[0].reasons, vec!["raw HTML rendered as text"]);
    }

    #[test]
    fn test_build_to_custom_out_dir() {
        let dir = blog();
        let site = Site::new(dir.path()).unwrap();
        let out = dir.path().join("dist");
        let report = run(&site, Some(out.clone())).unwrap();

        assert_eq!(report.out_dir, out);
        assert!(out.join("index.html").exists());
        assert!(!site.output_dir.exists());
    }

    #[test]
    fn test_report_serializes() {
        let dir = blog();
        let site = Site::new(dir.path()).unwrap();
        let report = run(&site, None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["posts"], 2);
        assert!(json["warnings"].as_array().unwrap().is_empty());
    }
}
