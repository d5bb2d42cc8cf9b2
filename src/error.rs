//! Fatal build errors
//!
//! Anything in here aborts the build. Soft problems (Markdown degradation,
//! size budget overruns) are reported as values in the build report instead.

use std::path::PathBuf;
use thiserror::Error;

/// A fatal error raised by the build pipeline
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{}: malformed front matter: {reason}", path.display())]
    MalformedFrontMatter { path: PathBuf, reason: String },

    #[error("{}: missing required field `{field}`", path.display())]
    MissingRequiredField { path: PathBuf, field: &'static str },

    #[error("{}: invalid date `{value}` (expected YYYY-MM-DD)", path.display())]
    InvalidDate { path: PathBuf, value: String },

    #[error("duplicate slug `{slug}`: {first} and {second}")]
    DuplicateSlug {
        slug: String,
        first: String,
        second: String,
    },

    #[error("failed to read {}", path.display())]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}", path.display())]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid site configuration: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl BuildError {
    /// Attach a source path to an error raised before the path was known.
    ///
    /// The front-matter parser and the page builder work on text only, so
    /// they report errors against an empty path and the collector fills it in.
    pub fn at(self, source: &std::path::Path) -> Self {
        let source = source.to_path_buf();
        match self {
            Self::MalformedFrontMatter { reason, .. } => Self::MalformedFrontMatter {
                path: source,
                reason,
            },
            Self::MissingRequiredField { field, .. } => Self::MissingRequiredField {
                path: source,
                field,
            },
            Self::InvalidDate { value, .. } => Self::InvalidDate {
                path: source,
                value,
            },
            other => other,
        }
    }
}

/// Result type for the build pipeline
pub type Result<T> = std::result::Result<T, BuildError>;
