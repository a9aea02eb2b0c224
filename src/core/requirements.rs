//! Packages this build depends on.

use std::fmt;

use serde::Serialize;

use crate::core::recipe::RecipeConfig;

/// A dependency on another package, pinned to an exact version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub name: String,
    pub version: String,
}

impl Requirement {
    pub fn new(name: &str, version: &str) -> Self {
        Requirement {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// Libraries the built ncurses links against.
pub fn requirements(config: &RecipeConfig) -> Vec<Requirement> {
    let mut reqs = Vec::new();
    if config.options.with_pcre2 {
        reqs.push(Requirement::new("pcre2", "10.33"));
    }
    if config.policy.is_msvc() {
        reqs.push(Requirement::new("getopt-for-visual-studio", "20200201"));
        reqs.push(Requirement::new("dirent", "1.23.2"));
        if config.options.extended_colors() {
            reqs.push(Requirement::new("naive-tsearch", "0.1.0"));
        }
    }
    reqs
}

/// What we know about the machine running the build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInfo {
    pub is_windows: bool,
    /// A POSIX shell was configured explicitly
    pub has_bash_path: bool,
    /// Running inside an msys2 shell (`MSYSTEM` is set)
    pub is_msys2: bool,
}

impl HostInfo {
    /// Inspect the current process.
    pub fn detect(configured_bash: bool) -> Self {
        HostInfo {
            is_windows: cfg!(windows),
            has_bash_path: configured_bash || std::env::var_os("NCURSES_RECIPE_BASH").is_some(),
            is_msys2: std::env::var_os("MSYSTEM").is_some(),
        }
    }
}

/// Tools needed on the build machine only.
pub fn build_requirements(host: &HostInfo) -> Vec<Requirement> {
    let mut reqs = Vec::new();
    if host.is_windows && !host.has_bash_path && !host.is_msys2 {
        reqs.push(Requirement::new("msys2", "20190524"));
    }
    reqs
}
