//! Packaging of an installed ncurses tree.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::builder::autotools::AutotoolsBuilder;
use crate::core::naming::{config_script_name, library_names};
use crate::core::recipe::{RecipeConfig, RecipePaths};
use crate::util::fs::{copy_file, glob_files};

/// A file copied into the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyOp {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// What packaging does after the build: copies, install, deletions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagePlan {
    /// Files copied before `make install`
    pub copies: Vec<CopyOp>,
    /// Installed files removed afterwards
    pub deletions: Vec<PathBuf>,
    /// Library names consumers link against, in link order
    pub libraries: Vec<String>,
}

impl PackagePlan {
    /// Compute the plan for `config`. Touches nothing.
    pub fn new(config: &RecipeConfig, paths: &RecipePaths) -> Self {
        let license = CopyOp {
            from: paths.source_dir.join("COPYING"),
            to: paths.package_dir.join("licenses").join("COPYING"),
        };

        // The config script would point consumers at the build machine's paths
        let config_script = paths
            .package_dir
            .join("bin")
            .join(config_script_name(&config.options, config.major_version()));

        PackagePlan {
            copies: vec![license],
            deletions: vec![config_script],
            libraries: library_names(&config.options, &config.platform),
        }
    }

    /// Copy the license, install, then remove unwanted files.
    pub fn execute(&self, builder: &AutotoolsBuilder<'_>) -> Result<()> {
        for op in &self.copies {
            copy_file(&op.from, &op.to)?;
        }

        builder.install()?;

        // A missing file means the install layout differs from the names
        // exported to consumers
        for path in &self.deletions {
            if !path.exists() {
                bail!(
                    "expected installed file is missing: {} (install layout does not match the configured options)",
                    path.display()
                );
            }
            std::fs::remove_file(path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            tracing::debug!("removed {}", path.display());
        }

        Ok(())
    }

    /// Libraries from the plan that were not found under `lib/`.
    pub fn missing_libraries(&self, paths: &RecipePaths) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for lib in &self.libraries {
            let patterns = vec![
                format!("lib/lib{}", lib),
                format!("lib/lib{}.*", lib),
                format!("lib/{}", lib),
                format!("lib/{}.*", lib),
            ];
            if glob_files(&paths.package_dir, &patterns)?.is_empty() {
                missing.push(lib.clone());
            }
        }
        Ok(missing)
    }
}

/// Package a built tree and return the plan that was carried out.
pub fn run_package(
    config: &RecipeConfig,
    paths: &RecipePaths,
    builder: &AutotoolsBuilder<'_>,
) -> Result<PackagePlan> {
    let plan = PackagePlan::new(config, paths);
    plan.execute(builder)?;

    for lib in plan.missing_libraries(paths)? {
        tracing::warn!("library `{}` was not installed", lib);
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionSet;
    use crate::core::platform::{Compiler, Os, PlatformDescriptor};
    use std::path::Path;
    use tempfile::TempDir;

    fn config(options: OptionSet) -> RecipeConfig {
        RecipeConfig::new(
            "6.2",
            options,
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64"),
        )
    }

    #[test]
    fn test_plan() {
        let paths = RecipePaths::under(Path::new("/work"));
        let plan = PackagePlan::new(&config(OptionSet::default()), &paths);

        assert_eq!(
            plan.copies,
            vec![CopyOp {
                from: PathBuf::from("/work/source/COPYING"),
                to: PathBuf::from("/work/package/licenses/COPYING"),
            }]
        );
        assert_eq!(
            plan.deletions,
            vec![PathBuf::from("/work/package/bin/ncursesw6-config")]
        );
        assert_eq!(plan.libraries[0], "ncurses++w");
    }

    #[test]
    fn test_missing_libraries() {
        let tmp = TempDir::new().unwrap();
        let paths = RecipePaths::under(tmp.path());
        let options = OptionSet {
            with_cxx: false,
            ..OptionSet::default()
        };
        let plan = PackagePlan::new(&config(options), &paths);

        let lib = paths.package_dir.join("lib");
        std::fs::create_dir_all(&lib).unwrap();
        for name in ["libformw.a", "libmenuw.a", "libncursesw.a"] {
            std::fs::write(lib.join(name), "").unwrap();
        }

        assert_eq!(plan.missing_libraries(&paths).unwrap(), vec!["panelw"]);
    }

    /// A work tree whose fake "make install" creates `installed` files in the package.
    #[cfg(unix)]
    fn fake_install(
        tmp: &TempDir,
        installed: &[&str],
    ) -> (RecipePaths, crate::builder::autotools::BuildTools) {
        use crate::builder::autotools::BuildTools;
        use std::os::unix::fs::PermissionsExt;

        let paths = RecipePaths::under(tmp.path());
        std::fs::create_dir_all(&paths.source_dir).unwrap();
        std::fs::create_dir_all(&paths.build_dir).unwrap();
        std::fs::write(paths.source_dir.join("COPYING"), "X11 license").unwrap();

        let pkg = paths.package_dir.display().to_string();
        let files: Vec<String> = installed.iter().map(|f| format!("{}/{}", pkg, f)).collect();
        let make = tmp.path().join("fake-make");
        std::fs::write(
            &make,
            format!(
                "#!/bin/sh\nmkdir -p {pkg}/bin {pkg}/lib\ntouch {}\n",
                files.join(" ")
            ),
        )
        .unwrap();
        std::fs::set_permissions(&make, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tools = BuildTools {
            shell: PathBuf::from("sh"),
            make,
        };
        (paths, tools)
    }

    #[test]
    #[cfg(unix)]
    fn test_run_package() {
        use crate::builder::toolchain::ToolchainScope;
        use crate::core::platform::PlatformPolicy;
        use std::collections::BTreeMap;

        let tmp = TempDir::new().unwrap();
        let (paths, tools) = fake_install(
            &tmp,
            &["bin/ncursesw6-config", "bin/tic", "lib/libncursesw.a"],
        );
        let scope = ToolchainScope::enter(PlatformPolicy::Posix, BTreeMap::new());
        let builder = AutotoolsBuilder::new(&scope, &tools, &paths);

        let plan = run_package(&config(OptionSet::default()), &paths, &builder).unwrap();

        assert_eq!(
            std::fs::read_to_string(paths.package_dir.join("licenses/COPYING")).unwrap(),
            "X11 license"
        );
        assert!(!paths.package_dir.join("bin/ncursesw6-config").exists());
        assert!(paths.package_dir.join("bin/tic").exists());
        assert_eq!(plan.libraries.len(), 5);
    }

    #[test]
    #[cfg(unix)]
    fn test_missing_config_script_fails_packaging() {
        use crate::builder::toolchain::ToolchainScope;
        use crate::core::platform::PlatformPolicy;
        use std::collections::BTreeMap;

        let tmp = TempDir::new().unwrap();
        // Installed without the wide-char suffix the options call for
        let (paths, tools) = fake_install(&tmp, &["bin/ncurses6-config", "lib/libncurses.a"]);
        let scope = ToolchainScope::enter(PlatformPolicy::Posix, BTreeMap::new());
        let builder = AutotoolsBuilder::new(&scope, &tools, &paths);

        let err = run_package(&config(OptionSet::default()), &paths, &builder).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("expected installed file is missing"), "{}", message);
        assert!(message.contains("ncursesw6-config"), "{}", message);
    }
}
