//! The resolved, immutable configuration of one build.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::options::{normalize_options, normalize_platform, OptionSet};
use crate::core::platform::{PlatformDescriptor, PlatformPolicy};

/// Options and platform after normalization, plus the resolved policy.
///
/// Built once per invocation and passed by reference through every step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeConfig {
    /// ncurses version being built (e.g. "6.2")
    pub version: String,
    pub options: OptionSet,
    pub platform: PlatformDescriptor,
    pub policy: PlatformPolicy,
}

impl RecipeConfig {
    /// Normalize `options` and `platform` and resolve the platform policy.
    pub fn new(version: impl Into<String>, options: OptionSet, platform: PlatformDescriptor) -> Self {
        let normalized = normalize_options(&options, &platform);
        let platform = normalize_platform(&normalized, &platform);
        let policy = platform.policy();

        RecipeConfig {
            version: version.into(),
            options: normalized,
            platform,
            policy,
        }
    }

    /// Leading numeric component of the version ("6.2" -> "6").
    pub fn major_version(&self) -> &str {
        let major = self.version.split('.').next().unwrap_or("");
        if !major.is_empty() && major.chars().all(|c| c.is_ascii_digit()) {
            major
        } else {
            ""
        }
    }
}

/// Directories one build works in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipePaths {
    /// Extracted (and patched) ncurses sources
    pub source_dir: PathBuf,
    /// Out-of-tree build directory
    pub build_dir: PathBuf,
    /// Install prefix; becomes the package
    pub package_dir: PathBuf,
}

impl RecipePaths {
    pub fn new(source_dir: PathBuf, build_dir: PathBuf, package_dir: PathBuf) -> Self {
        RecipePaths {
            source_dir,
            build_dir,
            package_dir,
        }
    }

    /// Standard layout under a work directory: `source/`, `build/`, `package/`.
    pub fn under(work_dir: &Path) -> Self {
        RecipePaths::new(
            work_dir.join("source"),
            work_dir.join("build"),
            work_dir.join("package"),
        )
    }
}
