//! Target platform description.
//!
//! A [`PlatformDescriptor`] carries the settings a build is keyed on
//! (operating system, compiler, architecture, build type). The branches the
//! recipe takes on it are collapsed once into a [`PlatformPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;

/// Operating system of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    Linux,
    Macos,
    Windows,
    FreeBsd,
    Other,
}

impl Os {
    /// Get the OS name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "Linux",
            Os::Macos => "Macos",
            Os::Windows => "Windows",
            Os::FreeBsd => "FreeBSD",
            Os::Other => "Other",
        }
    }

    /// Detect the host operating system.
    pub fn host() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::Macos,
            "windows" => Os::Windows,
            "freebsd" => Os::FreeBsd,
            _ => Os::Other,
        }
    }
}

impl FromStr for Os {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" => Ok(Os::Macos),
            "windows" => Ok(Os::Windows),
            "freebsd" => Ok(Os::FreeBsd),
            "other" => Ok(Os::Other),
            _ => Err(RecipeError::InvalidSettingValue {
                name: "os".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compiler {
    Gcc,
    Clang,
    AppleClang,
    /// Microsoft Visual C++
    Msvc,
}

impl Compiler {
    /// Get the compiler name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compiler::Gcc => "gcc",
            Compiler::Clang => "clang",
            Compiler::AppleClang => "apple-clang",
            Compiler::Msvc => "msvc",
        }
    }

    /// Guess the compiler a host would use by default.
    pub fn host_default(os: Os) -> Self {
        match os {
            Os::Windows => Compiler::Msvc,
            Os::Macos => Compiler::AppleClang,
            Os::FreeBsd => Compiler::Clang,
            Os::Linux | Os::Other => Compiler::Gcc,
        }
    }
}

impl FromStr for Compiler {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcc" => Ok(Compiler::Gcc),
            "clang" => Ok(Compiler::Clang),
            "apple-clang" => Ok(Compiler::AppleClang),
            "msvc" | "visual studio" | "cl" => Ok(Compiler::Msvc),
            _ => Err(RecipeError::InvalidSettingValue {
                name: "compiler".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build type, as understood by the configure flags we derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuildType {
    Debug,
    #[default]
    Release,
    RelWithDebInfo,
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl FromStr for BuildType {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildType::Debug),
            "release" => Ok(BuildType::Release),
            "relwithdebinfo" => Ok(BuildType::RelWithDebInfo),
            "minsizerel" => Ok(BuildType::MinSizeRel),
            _ => Err(RecipeError::InvalidSettingValue {
                name: "build_type".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings describing the platform a build targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    pub os: Os,
    pub compiler: Compiler,
    /// Compiler version, free-form (e.g. "13", "16")
    pub compiler_version: Option<String>,
    /// CPU architecture (x86_64, x86, armv8, ...)
    pub arch: String,
    pub build_type: BuildType,
    /// C++ standard library (C++ setting, dropped without the C++ binding)
    pub libcxx: Option<String>,
    /// C++ standard (C++ setting, dropped without the C++ binding)
    pub cppstd: Option<String>,
}

impl PlatformDescriptor {
    /// Create a descriptor with no C++ settings and no compiler version.
    pub fn new(os: Os, compiler: Compiler, arch: impl Into<String>) -> Self {
        PlatformDescriptor {
            os,
            compiler,
            compiler_version: None,
            arch: arch.into(),
            build_type: BuildType::default(),
            libcxx: None,
            cppstd: None,
        }
    }

    /// Detect the host platform.
    pub fn host() -> Self {
        let os = Os::host();
        let arch = match std::env::consts::ARCH {
            "aarch64" => "armv8",
            other => other,
        };
        PlatformDescriptor::new(os, Compiler::host_default(os), arch)
    }

    /// Set the build type.
    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    /// Whether the target is Windows-like.
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Return a copy with the C++-related settings removed.
    pub fn without_cxx_settings(&self) -> Self {
        PlatformDescriptor {
            libcxx: None,
            cppstd: None,
            ..self.clone()
        }
    }

    /// Apply a single `name=value` setting.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), RecipeError> {
        match name {
            "os" => self.os = value.parse()?,
            "compiler" => self.compiler = value.parse()?,
            "compiler.version" => self.compiler_version = Some(value.to_string()),
            "arch" => self.arch = value.to_string(),
            "build_type" => self.build_type = value.parse()?,
            "compiler.libcxx" => self.libcxx = Some(value.to_string()),
            "compiler.cppstd" => self.cppstd = Some(value.to_string()),
            _ => {
                return Err(RecipeError::UnknownSetting {
                    name: name.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Resolve the branching policy for this platform.
    pub fn policy(&self) -> PlatformPolicy {
        PlatformPolicy::resolve(self)
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.compiler)?;
        if let Some(ref version) = self.compiler_version {
            write!(f, "-{}", version)?;
        }
        write!(f, " {} {}", self.arch, self.build_type)
    }
}

/// The three ways the recipe treats a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlatformPolicy {
    /// Linux, macOS, BSDs: plain configure/make
    Posix,
    /// Windows with a GNU-style compiler running under an msys shell
    WindowsMingw,
    /// Windows with cl.exe driven through an msys shell
    WindowsMsvc,
}

impl PlatformPolicy {
    /// Resolve the policy from a descriptor.
    pub fn resolve(platform: &PlatformDescriptor) -> Self {
        match (platform.os, platform.compiler) {
            (_, Compiler::Msvc) => PlatformPolicy::WindowsMsvc,
            (Os::Windows, _) => PlatformPolicy::WindowsMingw,
            _ => PlatformPolicy::Posix,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformPolicy::Posix => "posix",
            PlatformPolicy::WindowsMingw => "windows-mingw",
            PlatformPolicy::WindowsMsvc => "windows-msvc",
        }
    }

    /// Whether the build runs under a Windows POSIX emulation shell.
    pub fn is_windows(&self) -> bool {
        !matches!(self, PlatformPolicy::Posix)
    }

    pub fn is_msvc(&self) -> bool {
        matches!(self, PlatformPolicy::WindowsMsvc)
    }

    /// Decoration appended to import library names of shared builds.
    pub fn import_lib_extension(&self) -> Option<&'static str> {
        match self {
            PlatformPolicy::Posix => None,
            PlatformPolicy::WindowsMingw => Some(".dll.a"),
            PlatformPolicy::WindowsMsvc => Some(".dll.lib"),
        }
    }
}

impl fmt::Display for PlatformPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
