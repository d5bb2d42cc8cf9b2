//! Asset publisher - persists a [`BuildOutput`] and the static files
//!
//! In staged mode the whole tree is written to a sibling directory first and
//! swapped into place with renames, so readers of the output directory see
//! either the previous build or the new one. In-place mode overwrites files
//! directly and leaves files from earlier builds alone.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};
use crate::generator::BuildOutput;
use crate::Site;

/// Suffix of the directory a staged publish writes into
pub(crate) const STAGING_SUFFIX: &str = "staging";
/// Suffix of the previous tree while it is being swapped out
pub(crate) const OLD_SUFFIX: &str = "old";

/// Counts from one publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Generated files written
    pub written: usize,
    /// Static files copied
    pub copied: usize,
    /// Static files shadowed by a generated file
    pub shadowed: usize,
}

/// Writes build results to the output directory
pub struct Publisher<'a> {
    site: &'a Site,
    out_dir: PathBuf,
}

impl<'a> Publisher<'a> {
    pub fn new(site: &'a Site) -> Self {
        Self::with_output(site, site.output_dir.clone())
    }

    /// Publish to a directory other than the configured one
    pub fn with_output(site: &'a Site, out_dir: PathBuf) -> Self {
        Self { site, out_dir }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Write static files and generated output
    pub fn publish(&self, output: &BuildOutput) -> Result<PublishStats> {
        guard_output_dir(self.site, &self.out_dir)?;

        if self.site.config.atomic_publish {
            self.publish_staged(output)
        } else {
            self.write_tree(&self.out_dir, output)
        }
    }

    fn publish_staged(&self, output: &BuildOutput) -> Result<PublishStats> {
        let staging = sibling(&self.out_dir, STAGING_SUFFIX)?;
        let old = sibling(&self.out_dir, OLD_SUFFIX)?;

        remove_dir(&staging)?;
        let stats = match self.write_tree(&staging, output) {
            Ok(stats) => stats,
            Err(e) => {
                // Leave the previous build untouched
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        remove_dir(&old)?;
        let had_previous = self.out_dir.exists();
        if had_previous {
            fs::rename(&self.out_dir, &old).map_err(|source| BuildError::IoWrite {
                path: self.out_dir.clone(),
                source,
            })?;
        }

        if let Err(source) = fs::rename(&staging, &self.out_dir) {
            if had_previous {
                if let Err(e) = fs::rename(&old, &self.out_dir) {
                    tracing::error!("Could not restore {:?}: {}", self.out_dir, e);
                }
            }
            return Err(BuildError::IoWrite {
                path: self.out_dir.clone(),
                source,
            });
        }

        if had_previous {
            remove_dir(&old)?;
        }
        tracing::debug!("Swapped staged output into {:?}", self.out_dir);
        Ok(stats)
    }

    /// Copy static files, then write every generated file under `dir`
    fn write_tree(&self, dir: &Path, output: &BuildOutput) -> Result<PublishStats> {
        let mut stats = PublishStats::default();
        create_dir(dir)?;

        let static_dir = &self.site.static_dir;
        if static_dir.exists() {
            for entry in WalkDir::new(static_dir)
                .follow_links(true)
                .sort_by_file_name()
            {
                let entry = entry.map_err(|e| BuildError::IoRead {
                    path: e.path().unwrap_or(static_dir).to_path_buf(),
                    source: e
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("filesystem loop")),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let relative = entry
                    .path()
                    .strip_prefix(static_dir)
                    .unwrap_or(entry.path());
                let key = output_key(relative);
                if output.contains(&key) {
                    tracing::warn!(
                        "Static file {:?} is shadowed by the generated {}",
                        entry.path(),
                        key
                    );
                    stats.shadowed += 1;
                    continue;
                }

                let dest = dir.join(relative);
                if let Some(parent) = dest.parent() {
                    create_dir(parent)?;
                }
                fs::copy(entry.path(), &dest)
                    .map_err(|source| BuildError::IoWrite { path: dest, source })?;
                stats.copied += 1;
            }
        } else {
            tracing::debug!("No static directory at {:?}", static_dir);
        }

        for (path, content) in output.files() {
            let dest = dir.join(path);
            if let Some(parent) = dest.parent() {
                create_dir(parent)?;
            }
            fs::write(&dest, content)
                .map_err(|source| BuildError::IoWrite { path: dest, source })?;
            stats.written += 1;
        }

        Ok(stats)
    }
}

/// Refuse output directories whose removal would take sources with them
pub fn guard_output_dir(site: &Site, out_dir: &Path) -> Result<()> {
    let sources = [&site.base_dir, &site.content_dir, &site.static_dir];
    if sources.iter().any(|src| src.starts_with(out_dir)) {
        return Err(BuildError::Config {
            path: site.config_path.clone().unwrap_or_default(),
            reason: format!(
                "output directory {} contains site sources",
                out_dir.display()
            ),
        });
    }
    Ok(())
}

/// `parent/.<name>.<suffix>` next to `dir`
pub(crate) fn sibling(dir: &Path, suffix: &str) -> Result<PathBuf> {
    let name = dir.file_name().ok_or_else(|| BuildError::IoWrite {
        path: dir.to_path_buf(),
        source: io::Error::other("output directory has no name"),
    })?;
    let name = format!(".{}.{}", name.to_string_lossy(), suffix);
    Ok(match dir.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    })
}

/// Output-relative path with `/` separators
fn output_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| BuildError::IoWrite {
        path: dir.to_path_buf(),
        source,
    })
}

fn remove_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|source| BuildError::IoWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
