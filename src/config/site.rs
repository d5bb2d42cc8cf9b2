//! Site configuration (site.yml)

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<S>(self, mut seq: S) -> std::result::Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    #[serde(alias = "language")]
    pub lang: String,

    // URL
    #[serde(alias = "siteUrl")]
    pub site_url: String,
    #[serde(alias = "baseUrl")]
    pub base_url: String,
    pub favicon: Option<String>,
    #[serde(alias = "defaultThumbnail")]
    pub default_thumbnail: Option<String>,

    // Directory
    pub content_dir: String,
    pub static_dir: String,
    pub output_dir: String,
    pub ignore: Vec<String>,

    // Output
    pub per_page: usize,
    pub minify: bool,
    pub atomic_publish: bool,
    pub budget: BudgetConfig,
    pub markdown: MarkdownConfig,

    // Theme
    pub palette: Option<Palette>,
    #[serde(alias = "paletteDark")]
    pub palette_dark: Option<Palette>,
    pub social: IndexMap<String, String>,
    pub presentation: PresentationConfig,

    // Crawlers
    #[serde(alias = "robotsTxt")]
    pub robots: RobotsConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "TinyBlog".to_string(),
            description: String::new(),
            lang: "en".to_string(),

            site_url: String::new(),
            base_url: "/".to_string(),
            favicon: None,
            default_thumbnail: None,

            content_dir: "content".to_string(),
            static_dir: "public".to_string(),
            output_dir: "build".to_string(),
            ignore: vec![
                "example.md".to_string(),
                "exemple.md".to_string(),
                "_example.md".to_string(),
                "_exemple.md".to_string(),
                ".*".to_string(),
            ],

            per_page: 10,
            minify: true,
            atomic_publish: true,
            budget: BudgetConfig::default(),
            markdown: MarkdownConfig::default(),

            palette: None,
            palette_dark: None,
            social: IndexMap::new(),
            presentation: PresentationConfig::default(),

            robots: RobotsConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file.
    ///
    /// `.toml` files go through `toml`; everything else (`.yml`, `.yaml`,
    /// `.json`) through `serde_yaml`, which reads JSON as well.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| BuildError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let config: SiteConfig = if is_toml {
            toml::from_str(&content).map_err(|e| BuildError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else if content.trim().is_empty() {
            SiteConfig::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| BuildError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        tracing::debug!("Loaded site configuration from {:?}", path);
        Ok(config.normalized())
    }

    /// Bring `base_url` into `/…/` form so URL joining never doubles or drops
    /// a separator.
    pub fn normalized(mut self) -> Self {
        let trimmed = self.base_url.trim().trim_matches('/');
        self.base_url = if trimmed.is_empty() {
            "/".to_string()
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            format!("{}/", trimmed)
        } else {
            format!("/{}/", trimmed)
        };
        self.site_url = self.site_url.trim().trim_end_matches('/').to_string();
        self
    }
}

/// Colour palette exposed as CSS variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub bg: String,
    pub fg: String,
    pub muted: String,
    pub link: String,
    pub accent: String,
    pub card: String,
    #[serde(alias = "cardBorder")]
    pub card_border: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            bg: "#fff".to_string(),
            fg: "#111".to_string(),
            muted: "#666".to_string(),
            link: "#0a6cff".to_string(),
            accent: "#3b82f6".to_string(),
            card: "#f8fafc".to_string(),
            card_border: "#e5e7eb".to_string(),
        }
    }
}

impl Palette {
    /// Render the palette as a CSS rule for `selector`
    pub fn to_css(&self, selector: &str) -> String {
        format!(
            "{}{{--bg:{};--fg:{};--muted:{};--link:{};--accent:{};--card:{};--card-border:{}}}",
            selector,
            self.bg,
            self.fg,
            self.muted,
            self.link,
            self.accent,
            self.card,
            self.card_border
        )
    }
}

/// Home page presentation header
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub enabled: bool,
    pub title: String,
    pub text: String,
    pub photo: Option<String>,
}

/// robots.txt generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotsConfig {
    #[serde(alias = "userAgent")]
    pub user_agent: String,
    #[serde(deserialize_with = "string_or_vec")]
    pub allow: Vec<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub disallow: Vec<String>,
    #[serde(alias = "crawlDelay")]
    pub crawl_delay: Option<u32>,
    pub sitemap: bool,
    #[serde(deserialize_with = "string_or_vec")]
    pub comments: Vec<String>,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            user_agent: "*".to_string(),
            allow: Vec::new(),
            disallow: Vec::new(),
            crawl_delay: None,
            sitemap: true,
            comments: Vec::new(),
        }
    }
}

/// Per page kind byte-size thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    pub index: usize,
    pub article: usize,
    pub other: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            index: 14 * 1024,
            article: 30 * 1024,
            other: 14 * 1024,
        }
    }
}

/// Markdown rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    pub allow_raw_html: bool,
    pub highlight_light: String,
    pub highlight_dark: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            allow_raw_html: false,
            highlight_light: "InspiredGitHub".to_string(),
            highlight_dark: "base16-ocean.dark".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "TinyBlog");
        assert_eq!(config.base_url, "/");
        assert_eq!(config.per_page, 10);
        assert_eq!(config.budget.index, 14 * 1024);
        assert_eq!(config.budget.article, 30 * 1024);
        assert!(config.atomic_publish);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
lang: fr
per_page: 5
budget:
  index: 2048
social:
  github: https://github.com/me
  mastodon: https://example.social/@me
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.lang, "fr");
        assert_eq!(config.per_page, 5);
        assert_eq!(config.budget.index, 2048);
        assert_eq!(config.budget.article, 30 * 1024);
        let keys: Vec<_> = config.social.keys().cloned().collect();
        assert_eq!(keys, vec!["github", "mastodon"]);
    }

    #[test]
    fn test_parse_json_with_camel_case_keys() {
        let json = r##"{
  "title": "Json Blog",
  "siteUrl": "https://example.com/",
  "paletteDark": {"bg": "#000", "cardBorder": "#333"},
  "robotsTxt": {"disallow": "/drafts/", "crawlDelay": 3}
}"##;
        let config: SiteConfig = serde_yaml::from_str::<SiteConfig>(json)
            .unwrap()
            .normalized();
        assert_eq!(config.site_url, "https://example.com");
        let dark = config.palette_dark.unwrap();
        assert_eq!(dark.bg, "#000");
        assert_eq!(dark.card_border, "#333");
        assert_eq!(dark.fg, "#111");
        assert_eq!(config.robots.disallow, vec!["/drafts/"]);
        assert_eq!(config.robots.crawl_delay, Some(3));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "title = \"Toml Blog\"\nbase_url = \"blog\"").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "Toml Blog");
        assert_eq!(config.base_url, "/blog/");
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.yml");
        fs::write(&path, "per_page: [not, a, number]").unwrap();

        let err = SiteConfig::load(&path).unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
    }

    #[test]
    fn test_palette_css() {
        let css = Palette::default().to_css("html[data-theme=light]");
        assert!(css.starts_with("html[data-theme=light]{--bg:#fff;"));
        assert!(css.ends_with("--card-border:#e5e7eb}"));
    }
}
