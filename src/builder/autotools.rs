//! Autotools driver: configure, make, make install.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::builder::configure::{CompilerFlags, ConfigureArgs};
use crate::builder::toolchain::ToolchainScope;
use crate::core::errors::RecipeError;
use crate::core::platform::PlatformPolicy;
use crate::core::recipe::RecipePaths;
use crate::util::config::ToolchainSettings;
use crate::util::fs::{ensure_dir, unix_path};
use crate::util::process::{find_bash, find_executable, find_make};

/// External programs the build runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTools {
    /// Shell that runs `configure`
    pub shell: PathBuf,
    pub make: PathBuf,
}

/// Find the shell and make, failing before any build step if one is missing.
///
/// Windows builds need a POSIX shell (msys2 bash); configure cannot run
/// without it, so its absence is a configuration error.
pub fn check_prerequisites(policy: PlatformPolicy, settings: &ToolchainSettings) -> Result<BuildTools> {
    let shell = if policy.is_windows() {
        find_bash(settings.bash.as_deref()).ok_or_else(|| RecipeError::MissingPrerequisite {
            tool: "bash".to_string(),
            hint: "install msys2 and set `toolchain.bash` in the config or NCURSES_RECIPE_BASH"
                .to_string(),
        })?
    } else {
        settings
            .bash
            .clone()
            .or_else(|| find_executable("sh"))
            .ok_or_else(|| RecipeError::MissingPrerequisite {
                tool: "sh".to_string(),
                hint: "a POSIX shell is required to run configure".to_string(),
            })?
    };

    let make = find_make(settings.make.as_deref()).ok_or_else(|| {
        RecipeError::MissingPrerequisite {
            tool: "make".to_string(),
            hint: "install GNU make or set `toolchain.make` in the config".to_string(),
        }
    })?;

    tracing::debug!("shell: {}, make: {}", shell.display(), make.display());
    Ok(BuildTools { shell, make })
}

/// Runs the native build of one configured source tree.
pub struct AutotoolsBuilder<'a> {
    scope: &'a ToolchainScope,
    tools: &'a BuildTools,
    paths: &'a RecipePaths,
    flags: CompilerFlags,
    jobs: usize,
}

impl<'a> AutotoolsBuilder<'a> {
    /// Create a new autotools builder.
    pub fn new(scope: &'a ToolchainScope, tools: &'a BuildTools, paths: &'a RecipePaths) -> Self {
        AutotoolsBuilder {
            scope,
            tools,
            paths,
            flags: CompilerFlags::default(),
            jobs: 1,
        }
    }

    /// Set the compiler flags exported to configure.
    pub fn flags(mut self, flags: CompilerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the number of parallel make jobs.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Configure, then build.
    ///
    /// Any failure aborts; native build failures are not retried.
    pub fn build(&self, args: &ConfigureArgs) -> Result<()> {
        ensure_dir(&self.paths.build_dir)?;
        self.configure(args)?;
        self.make()
    }

    /// Run the configure script out of tree.
    pub fn configure(&self, args: &ConfigureArgs) -> Result<()> {
        tracing::info!("Configuring ncurses");

        let script = self.paths.source_dir.join("configure");
        let mut cmd = self
            .scope
            .command(&self.tools.shell)
            .arg(self.shell_path(&script))
            .args(args.iter())
            .cwd(&self.paths.build_dir);

        for (key, value) in self.flags.to_env() {
            cmd = cmd.env(key, value);
        }

        cmd.exec_and_check("configure")?;
        Ok(())
    }

    /// Run make.
    pub fn make(&self) -> Result<()> {
        tracing::info!("Building ncurses ({} jobs)", self.jobs);

        self.scope
            .command(&self.tools.make)
            .arg(format!("-j{}", self.jobs))
            .cwd(&self.paths.build_dir)
            .exec_and_check("make")?;
        Ok(())
    }

    /// Run `make install` into the prefix chosen at configure time.
    pub fn install(&self) -> Result<()> {
        tracing::info!("Installing ncurses into {}", self.paths.package_dir.display());

        self.scope
            .command(&self.tools.make)
            .arg("install")
            .cwd(&self.paths.build_dir)
            .exec_and_check("install")?;
        Ok(())
    }

    fn shell_path(&self, path: &Path) -> String {
        if self.scope.policy().is_windows() {
            unix_path(path)
        } else {
            path.display().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_configured_tools_win() {
        let settings = ToolchainSettings {
            bash: Some(PathBuf::from("/custom/bash")),
            make: Some(PathBuf::from("/custom/make")),
            ..ToolchainSettings::default()
        };
        let tools = check_prerequisites(PlatformPolicy::WindowsMsvc, &settings).unwrap();
        assert_eq!(tools.shell, PathBuf::from("/custom/bash"));
        assert_eq!(tools.make, PathBuf::from("/custom/make"));
    }

    /// Stand-in configure script and make that record what they were given.
    #[cfg(unix)]
    fn fake_tree(tmp: &TempDir) -> (RecipePaths, BuildTools) {
        use std::os::unix::fs::PermissionsExt;

        let paths = RecipePaths::under(tmp.path());
        std::fs::create_dir_all(&paths.source_dir).unwrap();
        std::fs::write(
            paths.source_dir.join("configure"),
            "echo \"$@\" > configure.args\necho \"$CFLAGS\" > configure.cflags\necho \"$CC\" > configure.cc\n",
        )
        .unwrap();

        let make = tmp.path().join("fake-make");
        std::fs::write(&make, "#!/bin/sh\necho \"$@\" >> make.log\n").unwrap();
        std::fs::set_permissions(&make, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tools = BuildTools {
            shell: PathBuf::from("sh"),
            make,
        };
        (paths, tools)
    }

    #[test]
    #[cfg(unix)]
    fn test_build_runs_configure_then_make() {
        let tmp = TempDir::new().unwrap();
        let (paths, tools) = fake_tree(&tmp);

        let mut compiler_env = BTreeMap::new();
        compiler_env.insert("CC".to_string(), "fake-cc".to_string());
        let scope = ToolchainScope::enter(PlatformPolicy::Posix, compiler_env);

        let args = ConfigureArgs {
            args: vec!["--enable-widec".to_string(), "--without-tests".to_string()],
        };
        let flags = CompilerFlags {
            cflags: vec!["-O3".to_string(), "-fPIC".to_string()],
            ..CompilerFlags::default()
        };

        let builder = AutotoolsBuilder::new(&scope, &tools, &paths).flags(flags).jobs(3);
        builder.build(&args).unwrap();
        builder.install().unwrap();

        let read = |name: &str| std::fs::read_to_string(paths.build_dir.join(name)).unwrap();
        assert_eq!(read("configure.args").trim(), "--enable-widec --without-tests");
        assert_eq!(read("configure.cflags").trim(), "-O3 -fPIC");
        assert_eq!(read("configure.cc").trim(), "fake-cc");
        assert_eq!(read("make.log"), "-j3\ninstall\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_configure_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let (paths, tools) = fake_tree(&tmp);
        std::fs::write(
            paths.source_dir.join("configure"),
            "echo 'C compiler cannot create executables' >&2\nexit 77\n",
        )
        .unwrap();

        let scope = ToolchainScope::enter(PlatformPolicy::Posix, BTreeMap::new());
        let err = AutotoolsBuilder::new(&scope, &tools, &paths)
            .build(&ConfigureArgs::default())
            .unwrap_err();

        match err.downcast_ref::<RecipeError>() {
            Some(RecipeError::BuildStepFailed { step, code, stderr, .. }) => {
                assert_eq!(step, "configure");
                assert_eq!(*code, Some(77));
                assert!(stderr.contains("cannot create executables"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!paths.build_dir.join("make.log").exists());
    }
}
