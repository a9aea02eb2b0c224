//! Metadata exported to consumers of a built package.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::naming::{include_subdir, library_names};
use crate::core::platform::Os;
use crate::core::recipe::RecipeConfig;
use crate::util::fs::write_string;

/// File the package info is written to inside the package.
pub const PACKAGE_INFO_FILE: &str = "package-info.json";

/// How downstream builds consume the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    /// Include directories, relative to the package root
    pub include_dirs: Vec<PathBuf>,
    /// Library directories, relative to the package root
    pub lib_dirs: Vec<PathBuf>,
    /// Executable directories, relative to the package root
    pub bin_dirs: Vec<PathBuf>,
    /// Libraries to link, in link order
    pub libs: Vec<String>,
    pub defines: Vec<String>,
    pub system_libs: Vec<String>,
    /// Absolute directories consumers should add to PATH
    pub path_entries: Vec<PathBuf>,
}

/// Compute the exported info for a package rooted at `package_root`.
pub fn export_info(config: &RecipeConfig, package_root: &Path) -> PackageInfo {
    let options = &config.options;

    let mut info = PackageInfo {
        name: "ncurses".to_string(),
        version: config.version.clone(),
        include_dirs: vec![
            PathBuf::from("include"),
            Path::new("include").join(include_subdir(options)),
        ],
        lib_dirs: vec![PathBuf::from("lib")],
        bin_dirs: vec![PathBuf::from("bin")],
        libs: library_names(options, &config.platform),
        defines: Vec::new(),
        system_libs: Vec::new(),
        path_entries: Vec::new(),
    };

    if !options.shared {
        info.defines.push("NCURSES_STATIC".to_string());
        if config.platform.os == Os::Linux {
            info.system_libs.extend(["dl".to_string(), "m".to_string()]);
        }
    }

    if options.with_progs {
        info.path_entries.push(package_root.join("bin"));
    }

    info
}

impl PackageInfo {
    /// Load the info written next to an installed package.
    pub fn load(package_root: &Path) -> Result<Self> {
        let path = package_root.join(PACKAGE_INFO_FILE);
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Write the info into the package.
    pub fn save(&self, package_root: &Path) -> Result<PathBuf> {
        let path = package_root.join(PACKAGE_INFO_FILE);
        let json = serde_json::to_string_pretty(self)?;
        write_string(&path, &json)?;
        Ok(path)
    }

    /// Render a pkg-config file for the package.
    pub fn to_pkg_config(&self, package_root: &Path) -> String {
        let mut pc = String::new();
        let _ = writeln!(pc, "prefix={}", package_root.display());
        let _ = writeln!(pc, "libdir=${{prefix}}/lib");
        let _ = writeln!(pc, "includedir=${{prefix}}/include");
        let _ = writeln!(pc);
        let _ = writeln!(pc, "Name: {}", self.name);
        let _ = writeln!(pc, "Description: ncurses terminal handling library");
        let _ = writeln!(pc, "Version: {}", self.version);

        let mut libs = vec!["-L${libdir}".to_string()];
        libs.extend(self.libs.iter().map(|l| format!("-l{}", l)));
        libs.extend(self.system_libs.iter().map(|l| format!("-l{}", l)));
        let _ = writeln!(pc, "Libs: {}", libs.join(" "));

        let mut cflags: Vec<String> = self
            .include_dirs
            .iter()
            .map(|dir| {
                let rel = dir.strip_prefix("include").unwrap_or(dir);
                if rel.as_os_str().is_empty() {
                    "-I${includedir}".to_string()
                } else {
                    format!("-I${{includedir}}/{}", rel.display())
                }
            })
            .collect();
        cflags.extend(self.defines.iter().map(|d| format!("-D{}", d)));
        let _ = writeln!(pc, "Cflags: {}", cflags.join(" "));

        pc
    }

    /// Render as `key: value` lines for humans.
    pub fn to_text(&self) -> String {
        let join_paths = |paths: &[PathBuf]| {
            paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut out = String::new();
        let _ = writeln!(out, "package:      {}/{}", self.name, self.version);
        let _ = writeln!(out, "include dirs: {}", join_paths(&self.include_dirs));
        let _ = writeln!(out, "lib dirs:     {}", join_paths(&self.lib_dirs));
        let _ = writeln!(out, "libs:         {}", self.libs.join(" "));
        let _ = writeln!(out, "defines:      {}", self.defines.join(" "));
        let _ = writeln!(out, "system libs:  {}", self.system_libs.join(" "));
        let _ = writeln!(out, "PATH:         {}", join_paths(&self.path_entries));
        out
    }
}
