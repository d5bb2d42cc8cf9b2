//! tinyblog: a small static blog generator
//!
//! Markdown files with front matter go in, a complete static site comes out:
//! one page per post or static page, a paginated chronological index, one
//! listing per category, and the static assets copied over. Every rendered
//! page is checked against a byte-size budget.

pub mod aggregate;
pub mod budget;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod publish;
pub mod server;
pub mod templates;

use std::path::{Path, PathBuf};

pub use error::{BuildError, Result};

/// Configuration files looked up in the site directory, in order
pub const CONFIG_FILES: &[&str] = &["site.yml", "site.yaml", "site.json", "site.toml"];

/// A site on disk: its configuration and resolved directories
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Configuration file, when one was found
    pub config_path: Option<PathBuf>,
    /// Markdown sources
    pub content_dir: PathBuf,
    /// Files copied verbatim into the output
    pub static_dir: PathBuf,
    /// Output directory
    pub output_dir: PathBuf,
}

impl Site {
    /// Open the site in `base_dir`, reading the first configuration file
    /// found there. Without one, every setting has its default.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        match CONFIG_FILES
            .iter()
            .map(|name| base_dir.join(name))
            .find(|path| path.is_file())
        {
            Some(path) => Self::with_config_file(base_dir, path),
            None => {
                tracing::debug!("No site configuration in {:?}, using defaults", base_dir);
                Ok(Self::from_config(base_dir, config::SiteConfig::default()))
            }
        }
    }

    /// Open the site in `base_dir` with an explicit configuration file
    pub fn with_config_file<P: AsRef<Path>, C: AsRef<Path>>(base_dir: P, config_path: C) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(config_path.as_ref());
        let config = config::SiteConfig::load(&config_path)?;

        let mut site = Self::from_config(base_dir, config);
        site.config_path = Some(config_path);
        Ok(site)
    }

    /// Build a site from an in-memory configuration
    pub fn from_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = config.normalized();

        let content_dir = base_dir.join(&config.content_dir);
        let static_dir = base_dir.join(&config.static_dir);
        let output_dir = base_dir.join(&config.output_dir);

        Self {
            config,
            base_dir,
            config_path: None,
            content_dir,
            static_dir,
            output_dir,
        }
    }

    /// Paths whose changes call for a rebuild
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.content_dir.clone(), self.static_dir.clone()];
        paths.extend(self.config_path.clone());
        paths
    }

    /// Build and publish the site
    pub fn build(&self) -> anyhow::Result<commands::build::BuildReport> {
        commands::build::run(self, None)
    }

    /// Clean the output directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_without_config() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(site.config_path.is_none());
        assert_eq!(site.content_dir, dir.path().join("content"));
        assert_eq!(site.static_dir, dir.path().join("public"));
        assert_eq!(site.output_dir, dir.path().join("build"));
    }

    #[test]
    fn test_site_finds_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("site.json"),
            r#"{"title": "Json", "content_dir": "posts", "output_dir": "out"}"#,
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Json");
        assert_eq!(site.config_path, Some(dir.path().join("site.json")));
        assert_eq!(site.content_dir, dir.path().join("posts"));
        assert_eq!(site.output_dir, dir.path().join("out"));
        assert_eq!(site.watched_paths().len(), 3);
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("other.yml"), "title: Other\n").unwrap();
        fs::write(dir.path().join("site.yml"), "title: Default\n").unwrap();

        let site = Site::with_config_file(dir.path(), "other.yml").unwrap();
        assert_eq!(site.config.title, "Other");
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Site::with_config_file(dir.path(), "nope.yml").unwrap_err();
        assert!(matches!(err, BuildError::IoRead { .. }));
    }
}
