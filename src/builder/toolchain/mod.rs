//! Toolchain environment for the autotools build.
//!
//! GNU-style compilers need nothing beyond what configure finds on its own.
//! cl.exe is driven through configure by pointing the usual tool variables
//! (`CC`, `LD`, `AR`, ...) at the MSVC tools, inside an environment where
//! `vcvarsall.bat` has been applied.
//!
//! The environment is never written into the current process. A
//! [`ToolchainScope`] holds it as an overlay and applies it to each command
//! spawned through the scope; [`with_toolchain_scope`] bounds its lifetime
//! to a closure, so it is gone on every exit path.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::core::platform::PlatformPolicy;
use crate::core::recipe::RecipeConfig;
use crate::util::process::ProcessBuilder;

pub mod msvc;

/// Tool variables exported for one toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolchainEnv {
    vars: BTreeMap<String, String>,
}

impl ToolchainEnv {
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|v| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }
}

impl FromIterator<(String, String)> for ToolchainEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ToolchainEnv {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Tool variables for `policy`; empty for everything but MSVC.
pub fn build_toolchain_env(policy: PlatformPolicy) -> ToolchainEnv {
    match policy {
        PlatformPolicy::WindowsMsvc => msvc::tool_env(),
        PlatformPolicy::Posix | PlatformPolicy::WindowsMingw => ToolchainEnv::default(),
    }
}

/// An active toolchain environment.
#[derive(Debug)]
pub struct ToolchainScope {
    policy: PlatformPolicy,
    overlay: BTreeMap<String, String>,
}

impl ToolchainScope {
    /// Enter a scope from an already captured compiler environment.
    ///
    /// Tool variables take precedence over the captured environment.
    pub fn enter(policy: PlatformPolicy, compiler_env: BTreeMap<String, String>) -> Self {
        let mut overlay = compiler_env;
        for (key, value) in build_toolchain_env(policy).iter() {
            overlay.insert(key.clone(), value.clone());
        }
        tracing::debug!(
            "entering {} toolchain scope ({} variables)",
            policy,
            overlay.len()
        );
        ToolchainScope { policy, overlay }
    }

    pub fn policy(&self) -> PlatformPolicy {
        self.policy
    }

    /// Start a command that runs inside this scope.
    pub fn command(&self, program: impl AsRef<Path>) -> ProcessBuilder {
        ProcessBuilder::new(program).envs(self.overlay.iter())
    }
}

/// Run `f` inside the toolchain scope for `config`.
///
/// For MSVC the compiler environment is captured first; a missing Visual
/// Studio installation fails here, before anything is built.
pub fn with_toolchain_scope<T>(
    config: &RecipeConfig,
    f: impl FnOnce(&ToolchainScope) -> Result<T>,
) -> Result<T> {
    let compiler_env = if config.policy.is_msvc() {
        msvc::vcvars_environment(&config.platform.arch)?
    } else {
        BTreeMap::new()
    };

    let scope = ToolchainScope::enter(config.policy, compiler_env);
    let result = f(&scope);
    drop(scope);
    tracing::debug!("left {} toolchain scope", config.policy);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionSet;
    use crate::core::platform::{Compiler, Os, PlatformDescriptor};

    #[test]
    fn test_env_only_for_msvc() {
        assert!(build_toolchain_env(PlatformPolicy::Posix).is_empty());
        assert!(build_toolchain_env(PlatformPolicy::WindowsMingw).is_empty());

        let env = build_toolchain_env(PlatformPolicy::WindowsMsvc);
        assert_eq!(env.get("CC"), Some("cl -nologo"));
        assert_eq!(env.get("AR"), Some("lib -nologo"));
    }

    #[test]
    fn test_scope_overlay_precedence() {
        let mut captured = BTreeMap::new();
        captured.insert("INCLUDE".to_string(), r"C:\VC\include".to_string());
        captured.insert("CC".to_string(), "cl".to_string());

        let scope = ToolchainScope::enter(PlatformPolicy::WindowsMsvc, captured);
        let cmd = scope.command("make");
        let var = |key: &str| cmd.get_env().get(key).map(|s| s.as_str());

        assert_eq!(var("INCLUDE"), Some(r"C:\VC\include"));
        assert_eq!(var("CC"), Some("cl -nologo"));
        assert_eq!(var("LD"), Some("link -nologo"));
    }

    #[test]
    fn test_posix_scope_is_empty() {
        let config = RecipeConfig::new(
            "6.2",
            OptionSet::default(),
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64"),
        );
        let vars = with_toolchain_scope(&config, |scope| {
            assert_eq!(scope.policy(), PlatformPolicy::Posix);
            Ok(scope.command("make").get_env().len())
        })
        .unwrap();
        assert_eq!(vars, 0);
    }

    #[test]
    fn test_scope_passes_errors_through() {
        let config = RecipeConfig::new(
            "6.2",
            OptionSet::default(),
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64"),
        );
        let result: Result<()> = with_toolchain_scope(&config, |_| anyhow::bail!("make failed"));
        assert_eq!(result.unwrap_err().to_string(), "make failed");
    }
}
