//! Clean the output directory

use anyhow::Result;
use std::fs;

use crate::publish::{guard_output_dir, sibling, OLD_SUFFIX, STAGING_SUFFIX};
use crate::Site;

/// Remove the output directory and any leftovers of an interrupted publish
pub fn run(site: &Site) -> Result<()> {
    let out = &site.output_dir;
    guard_output_dir(site, out)?;

    let targets = [
        out.clone(),
        sibling(out, STAGING_SUFFIX)?,
        sibling(out, OLD_SUFFIX)?,
    ];

    for target in targets.iter().filter(|t| t.exists()) {
        fs::remove_dir_all(target)?;
        tracing::info!("Deleted: {:?}", target);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_output_and_staging() {
        let dir = TempDir::new().unwrap();
        let site = Site::from_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(site.output_dir.join("category")).unwrap();
        fs::write(site.output_dir.join("index.html"), "x").unwrap();
        fs::create_dir_all(dir.path().join(".build.staging")).unwrap();

        run(&site).unwrap();
        assert!(!site.output_dir.exists());
        assert!(!dir.path().join(".build.staging").exists());

        // Cleaning twice is fine
        run(&site).unwrap();
    }

    #[test]
    fn test_clean_removes_what_an_interrupted_publish_leaves() {
        let dir = TempDir::new().unwrap();
        let site = Site::from_config(dir.path(), SiteConfig::default());
        let staging = sibling(&site.output_dir, STAGING_SUFFIX).unwrap();
        let old = sibling(&site.output_dir, OLD_SUFFIX).unwrap();
        fs::create_dir_all(&staging).unwrap();
        fs::create_dir_all(&old).unwrap();

        run(&site).unwrap();
        assert!(!staging.exists());
        assert!(!old.exists());
    }
}
