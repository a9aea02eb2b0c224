//! Per-version source data.
//!
//! The data file maps each ncurses version to its tarball and the patches
//! applied on top of it:
//!
//! ```toml
//! [sources."6.2"]
//! url = "https://ftp.gnu.org/pub/gnu/ncurses/ncurses-6.2.tar.gz"
//! sha256 = "..."
//! strip_prefix = "ncurses-6.2"
//!
//! [[patches."6.2"]]
//! file = "patches/0001-fix.patch"
//! sha256 = "..."
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;
use crate::sources::tarball::Location;

const BUNDLED: &str = include_str!("../../data/ncurses.toml");

/// Tarball source specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarballSource {
    /// Download URL, `file://` URL or local path
    pub url: String,

    /// SHA256 hash of the tarball
    pub sha256: String,

    /// Directory prefix to strip from tarball (e.g., "ncurses-6.2")
    #[serde(default)]
    pub strip_prefix: Option<String>,
}

/// A patch to apply to the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSpec {
    /// Path to patch file, relative to the data file's directory
    pub file: String,

    /// SHA256 hash of the patch file bytes
    pub sha256: String,
}

/// Sources and patches for every known version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeData {
    pub sources: BTreeMap<String, TarballSource>,

    #[serde(default)]
    pub patches: BTreeMap<String, Vec<PatchSpec>>,

    /// Directory patch paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl RecipeData {
    /// The data shipped with this crate.
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED, Path::new(".")).context("failed to parse bundled recipe data")
    }

    /// Load a data file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe data: {}", path.display()))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        Self::parse(&contents, base_dir)
            .with_context(|| format!("failed to parse recipe data: {}", path.display()))
    }

    /// Parse data from TOML.
    ///
    /// Relative local tarball paths are resolved against `base_dir`, like
    /// patch files.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self> {
        let mut data: RecipeData = toml::from_str(contents)?;
        for source in data.sources.values_mut() {
            if let Location::Local(path) = Location::parse(&source.url)? {
                if path.is_relative() {
                    source.url = base_dir.join(path).display().to_string();
                }
            }
        }
        data.base_dir = base_dir.to_path_buf();
        Ok(data)
    }

    /// Known versions, oldest first.
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = self.sources.keys().map(|v| v.as_str()).collect();
        versions.sort_by_key(|v| version_key(v));
        versions
    }

    /// The newest known version.
    pub fn latest_version(&self) -> Option<&str> {
        self.versions().last().copied()
    }

    /// The tarball for `version`.
    pub fn source(&self, version: &str) -> Result<&TarballSource, RecipeError> {
        self.sources
            .get(version)
            .ok_or_else(|| RecipeError::UnknownVersion {
                version: version.to_string(),
                available: self.versions().join(", "),
            })
    }

    /// Patches for `version` with resolved paths, in application order.
    pub fn patches(&self, version: &str) -> Vec<(PathBuf, &PatchSpec)> {
        self.patches
            .get(version)
            .map(|patches| {
                patches
                    .iter()
                    .map(|p| (self.base_dir.join(&p.file), p))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Sort key comparing dotted versions numerically ("6.10" > "6.9").
fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = r#"
        [sources."6.1"]
        url = "https://ftp.gnu.org/pub/gnu/ncurses/ncurses-6.1.tar.gz"
        sha256 = "aa"

        [sources."6.10"]
        url = "https://ftp.gnu.org/pub/gnu/ncurses/ncurses-6.10.tar.gz"
        sha256 = "bb"

        [sources."6.2"]
        url = "https://ftp.gnu.org/pub/gnu/ncurses/ncurses-6.2.tar.gz"
        sha256 = "cc"
        strip_prefix = "ncurses-6.2"

        [[patches."6.2"]]
        file = "patches/0001-a.patch"
        sha256 = "dd"

        [[patches."6.2"]]
        file = "patches/0002-b.patch"
        sha256 = "ee"
    "#;

    #[test]
    fn test_bundled_data_parses() {
        let data = RecipeData::bundled().unwrap();
        let source = data.source("6.2").unwrap();
        assert!(source.url.ends_with("ncurses-6.2.tar.gz"));
        assert_eq!(source.sha256.len(), 64);
    }

    #[test]
    fn test_versions_sorted_numerically() {
        let data = RecipeData::parse(DATA, Path::new("/recipes/ncurses")).unwrap();
        assert_eq!(data.versions(), vec!["6.1", "6.2", "6.10"]);
        assert_eq!(data.latest_version(), Some("6.10"));
    }

    #[test]
    fn test_patches_resolved_in_order() {
        let data = RecipeData::parse(DATA, Path::new("/recipes/ncurses")).unwrap();
        let patches = data.patches("6.2");
        assert_eq!(patches.len(), 2);
        assert_eq!(
            patches[0].0,
            PathBuf::from("/recipes/ncurses/patches/0001-a.patch")
        );
        assert_eq!(patches[1].1.sha256, "ee");
        assert!(data.patches("6.1").is_empty());
    }

    #[test]
    fn test_relative_tarball_resolved_against_data_dir() {
        let data = RecipeData::parse(
            r#"
            [sources."6.2"]
            url = "mirror/ncurses-6.2.tar.gz"
            sha256 = "cc"

            [sources."6.1"]
            url = "/srv/ncurses-6.1.tar.gz"
            sha256 = "aa"
            "#,
            Path::new("/recipes/ncurses"),
        )
        .unwrap();

        assert_eq!(
            data.source("6.2").unwrap().url,
            Path::new("/recipes/ncurses/mirror/ncurses-6.2.tar.gz")
                .display()
                .to_string()
        );
        assert_eq!(data.source("6.1").unwrap().url, "/srv/ncurses-6.1.tar.gz");

        let remote = RecipeData::parse(DATA, Path::new("/recipes/ncurses")).unwrap();
        assert!(remote.source("6.2").unwrap().url.starts_with("https://"));
    }

    #[test]
    fn test_unknown_version() {
        let data = RecipeData::parse(DATA, Path::new(".")).unwrap();
        match data.source("5.9") {
            Err(RecipeError::UnknownVersion { available, .. }) => {
                assert_eq!(available, "6.1, 6.2, 6.10");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
