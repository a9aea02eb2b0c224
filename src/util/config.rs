//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.ncurses-recipe/config.toml` - User-wide defaults
//! - Project: `.ncurses-recipe/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Toolchain overrides
    pub toolchain: ToolchainSettings,

    /// Network settings
    pub net: NetConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parallel make jobs (defaults to the number of CPUs)
    pub jobs: Option<usize>,

    /// Directory holding `source/`, `build/` and `package/`
    pub work_dir: Option<PathBuf>,
}

/// Toolchain overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// POSIX shell used to run `configure` (msys bash on Windows)
    pub bash: Option<PathBuf>,

    /// `make` implementation
    pub make: Option<PathBuf>,

    /// Additional C compiler flags
    pub cflags: Vec<String>,

    /// Additional C++ compiler flags
    pub cxxflags: Vec<String>,

    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// Network configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Never download; only use cached or local tarballs
    pub offline: bool,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.work_dir.is_some() {
            self.build.work_dir = other.build.work_dir;
        }
        if other.toolchain.bash.is_some() {
            self.toolchain.bash = other.toolchain.bash;
        }
        if other.toolchain.make.is_some() {
            self.toolchain.make = other.toolchain.make;
        }
        if !other.toolchain.cflags.is_empty() {
            self.toolchain.cflags = other.toolchain.cflags;
        }
        if !other.toolchain.cxxflags.is_empty() {
            self.toolchain.cxxflags = other.toolchain.cxxflags;
        }
        if !other.toolchain.ldflags.is_empty() {
            self.toolchain.ldflags = other.toolchain.ldflags;
        }
        if other.net.offline {
            self.net.offline = true;
        }
    }

    /// Parallel jobs to hand to make.
    pub fn jobs(&self) -> usize {
        self.build.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Load merged configuration from global and project locations.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global config directory (~/.ncurses-recipe).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".ncurses-recipe"))
}

/// Get the global config path (~/.ncurses-recipe/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.ncurses-recipe/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".ncurses-recipe").join("config.toml")
}

/// Directory for downloaded tarballs.
pub fn download_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "ncurses-recipe")
        .map(|dirs| dirs.cache_dir().join("downloads"))
        .unwrap_or_else(|| std::env::temp_dir().join("ncurses-recipe").join("downloads"))
}
