//! The full recipe pipeline: fetch, build, package, export.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::builder::autotools::{check_prerequisites, AutotoolsBuilder};
use crate::builder::configure::{build_configure_args, CompilerFlags, ConfigureArgs};
use crate::builder::package::{run_package, PackagePlan};
use crate::builder::toolchain::{build_toolchain_env, with_toolchain_scope, ToolchainEnv};
use crate::core::recipe::{RecipeConfig, RecipePaths};
use crate::core::requirements::{build_requirements, requirements, HostInfo, Requirement};
use crate::ops::package_info::{export_info, PackageInfo};
use crate::sources::{apply_patches, fetch_source, PatchSpec, RecipeData};
use crate::util::config::{download_cache_dir, Config};
use crate::util::fs::{list_files, remove_dir_all_if_exists, write_string};

/// Everything a build would do, computed without doing it.
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub config: RecipeConfig,
    pub paths: RecipePaths,
    pub requirements: Vec<Requirement>,
    pub build_requirements: Vec<Requirement>,
    pub configure_args: ConfigureArgs,
    pub compiler_flags: CompilerFlags,
    pub toolchain_env: ToolchainEnv,
    pub package: PackagePlan,
    pub package_info: PackageInfo,
}

impl BuildPlan {
    /// Derive the plan for `config` building in `paths`.
    pub fn new(config: &RecipeConfig, paths: &RecipePaths, tool_config: &Config) -> Self {
        let host = HostInfo::detect(tool_config.toolchain.bash.is_some());
        let settings = &tool_config.toolchain;

        BuildPlan {
            config: config.clone(),
            paths: paths.clone(),
            requirements: requirements(config),
            build_requirements: build_requirements(&host),
            configure_args: build_configure_args(config, paths),
            compiler_flags: CompilerFlags::for_config(config).with_extra(
                &settings.cflags,
                &settings.cxxflags,
                &settings.ldflags,
            ),
            toolchain_env: build_toolchain_env(config.policy),
            package: PackagePlan::new(config, paths),
            package_info: export_info(config, &paths.package_dir),
        }
    }
}

/// Inputs of a build run.
pub struct BuildRequest<'a> {
    pub config: &'a RecipeConfig,
    pub paths: &'a RecipePaths,
    pub data: &'a RecipeData,
    pub tool_config: &'a Config,
    /// Re-extract sources even if a prepared tree is present
    pub fresh_source: bool,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub plan: BuildPlan,
    pub package: PackagePlan,
    pub info: PackageInfo,
    pub info_path: PathBuf,
    /// Files in the finished package, relative to its root
    pub files: Vec<PathBuf>,
}

/// Run the whole recipe.
///
/// Prerequisites are checked before anything is fetched or built. The
/// first failing step aborts the run.
pub fn build(req: BuildRequest<'_>) -> Result<BuildOutcome> {
    let BuildRequest {
        config,
        paths,
        data,
        tool_config,
        fresh_source,
    } = req;

    tracing::info!(
        "Building ncurses {} for {} ({})",
        config.version,
        config.platform,
        config.policy
    );
    tracing::debug!("options: {}", config.options);

    let plan = BuildPlan::new(config, paths, tool_config);
    for dep in plan.requirements.iter().chain(&plan.build_requirements) {
        tracing::info!("requires {}", dep);
    }

    let tools = check_prerequisites(config.policy, &tool_config.toolchain)?;

    prepare_sources(config, paths, data, tool_config, fresh_source)?;
    // Packaging deletes by name, so files from an earlier install must go
    remove_dir_all_if_exists(&paths.package_dir)?;

    let package = with_toolchain_scope(config, |scope| {
        let builder = AutotoolsBuilder::new(scope, &tools, paths)
            .flags(plan.compiler_flags.clone())
            .jobs(tool_config.jobs());
        builder.build(&plan.configure_args)?;
        run_package(config, paths, &builder)
    })?;

    let info = plan.package_info.clone();
    let info_path = info.save(&paths.package_dir)?;
    for entry in &info.path_entries {
        tracing::info!("Appending PATH environment variable: {}", entry.display());
    }
    let files = list_files(&paths.package_dir)?;

    tracing::info!(
        "Packaged {} files into {}",
        files.len(),
        paths.package_dir.display()
    );

    Ok(BuildOutcome {
        plan,
        package,
        info,
        info_path,
        files,
    })
}

/// Marker written into the source tree once it is extracted and patched.
pub const PREPARED_MARKER: &str = ".ncurses-recipe-prepared";

/// Make sure `paths.source_dir` holds patched sources for `config.version`.
///
/// A tree is reused only if its marker records the same version, tarball
/// and patches. Anything else is wiped and extracted again, together with
/// the build and package directories that came from it.
pub fn prepare_sources(
    config: &RecipeConfig,
    paths: &RecipePaths,
    data: &RecipeData,
    tool_config: &Config,
    fresh: bool,
) -> Result<()> {
    let source = data.source(&config.version)?;
    let patches = data.patches(&config.version);
    let fingerprint = source_fingerprint(&config.version, &source.sha256, &patches);
    let marker = paths.source_dir.join(PREPARED_MARKER);

    if !fresh {
        if let Ok(recorded) = std::fs::read_to_string(&marker) {
            if recorded == fingerprint {
                tracing::info!("Reusing sources in {}", paths.source_dir.display());
                return Ok(());
            }
            tracing::info!("Sources in {} are stale", paths.source_dir.display());
        }
    }

    remove_dir_all_if_exists(&paths.source_dir)?;
    remove_dir_all_if_exists(&paths.build_dir)?;
    remove_dir_all_if_exists(&paths.package_dir)?;

    fetch_source(
        source,
        &paths.source_dir,
        &download_cache_dir(),
        tool_config.net.offline,
    )?;
    apply_patches(patches, &paths.source_dir)?;

    write_string(&marker, &fingerprint)?;
    Ok(())
}

/// What a prepared source tree was made from.
fn source_fingerprint(version: &str, sha256: &str, patches: &[(PathBuf, &PatchSpec)]) -> String {
    let mut out = format!("version={}\nsource={}\n", version, sha256.to_lowercase());
    for (_, patch) in patches {
        out.push_str(&format!("patch={}:{}\n", patch.file, patch.sha256.to_lowercase()));
    }
    out
}

/// Default work directory for a configuration: `<root>/ncurses-<version>-<hash>`.
///
/// Distinct configurations never share a directory.
pub fn default_work_dir(root: &Path, config: &RecipeConfig) -> PathBuf {
    let key = serde_json::to_string(config).unwrap_or_default();
    let hash = crate::util::hash::sha256_bytes(key.as_bytes());
    root.join(format!("ncurses-{}-{}", config.version, &hash[..12]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::options::OptionSet;
    use crate::core::platform::{Compiler, Os, PlatformDescriptor};
    use crate::sources::tarball::tests::make_tarball;
    use crate::util::hash::sha256_bytes;
    use tempfile::TempDir;

    fn linux_config(options: OptionSet) -> RecipeConfig {
        RecipeConfig::new(
            "6.2",
            options,
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64"),
        )
    }

    #[test]
    fn test_plan_is_consistent() {
        let config = linux_config(OptionSet::default());
        let paths = RecipePaths::under(Path::new("/work"));
        let plan = BuildPlan::new(&config, &paths, &Config::default());

        assert!(plan.configure_args.contains("--enable-widec"));
        assert!(plan.toolchain_env.is_empty());
        assert_eq!(plan.package.libraries, plan.package_info.libs);
        assert!(plan.requirements.is_empty());
    }

    #[test]
    fn test_plan_serializes() {
        let config = RecipeConfig::new(
            "6.2",
            OptionSet::default(),
            PlatformDescriptor::new(Os::Windows, Compiler::Msvc, "x86"),
        );
        let plan = BuildPlan::new(&config, &RecipePaths::under(Path::new("/w")), &Config::default());
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["toolchain_env"]["CC"], "cl -nologo");
        assert_eq!(json["config"]["policy"], "WindowsMsvc");
        assert!(json["configure_args"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "--host=x86-w64-mingw32-msvc7"));
    }

    #[test]
    fn test_default_work_dir_differs_per_config() {
        let root = Path::new("/cache");
        let a = default_work_dir(root, &linux_config(OptionSet::default()));
        let b = default_work_dir(
            root,
            &linux_config(OptionSet {
                shared: true,
                ..OptionSet::default()
            }),
        );
        assert_ne!(a, b);
        assert_eq!(a, default_work_dir(root, &linux_config(OptionSet::default())));
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("ncurses-6.2-"));
    }

    /// Write a 6.2 tarball into `tmp` and describe it, plus `extra` data lines.
    fn local_data(tmp: &TempDir, extra: &str) -> RecipeData {
        let tarball = make_tarball(&[
            ("ncurses-6.2/configure", "#!/bin/sh\n"),
            ("ncurses-6.2/COPYING", "license"),
        ]);
        let tarball_path = tmp.path().join("ncurses-6.2.tar.gz");
        std::fs::write(&tarball_path, &tarball).unwrap();

        RecipeData::parse(
            &format!(
                "[sources.\"6.2\"]\nurl = \"{}\"\nsha256 = \"{}\"\nstrip_prefix = \"ncurses-6.2\"\n{}",
                tarball_path.display(),
                sha256_bytes(&tarball),
                extra
            ),
            tmp.path(),
        )
        .unwrap()
    }

    #[test]
    fn test_prepare_sources_from_local_tarball() {
        let tmp = TempDir::new().unwrap();
        let data = local_data(&tmp, "");

        let config = linux_config(OptionSet::default());
        let paths = RecipePaths::under(&tmp.path().join("work"));
        prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap();
        assert!(paths.source_dir.join("COPYING").is_file());
        assert!(paths.source_dir.join(PREPARED_MARKER).is_file());

        // A prepared tree is reused as is
        std::fs::write(paths.source_dir.join("marker"), "").unwrap();
        prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap();
        assert!(paths.source_dir.join("marker").exists());

        prepare_sources(&config, &paths, &data, &Config::default(), true).unwrap();
        assert!(!paths.source_dir.join("marker").exists());
    }

    #[test]
    fn test_stale_marker_forces_reextract() {
        let tmp = TempDir::new().unwrap();
        let data = local_data(&tmp, "");
        let config = linux_config(OptionSet::default());
        let paths = RecipePaths::under(&tmp.path().join("work"));

        prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap();
        std::fs::write(paths.source_dir.join("marker"), "").unwrap();
        std::fs::write(paths.source_dir.join(PREPARED_MARKER), "version=6.1\n").unwrap();
        std::fs::create_dir_all(&paths.package_dir).unwrap();
        std::fs::write(paths.package_dir.join("old.h"), "").unwrap();

        prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap();
        assert!(!paths.source_dir.join("marker").exists());
        assert!(!paths.package_dir.join("old.h").exists());
    }

    #[test]
    fn test_failed_patch_is_not_reused() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("fix.patch"), "--- a/x\n+++ b/x\n").unwrap();
        let data = local_data(
            &tmp,
            &format!(
                "[[patches.\"6.2\"]]\nfile = \"fix.patch\"\nsha256 = \"{}\"\n",
                "0".repeat(64)
            ),
        );
        let config = linux_config(OptionSet::default());
        let paths = RecipePaths::under(&tmp.path().join("work"));

        let err = prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap_err();
        assert!(err.to_string().contains("sha256 mismatch"));
        assert!(paths.source_dir.join("configure").is_file());
        assert!(!paths.source_dir.join(PREPARED_MARKER).exists());

        // The unpatched tree from the failed run must not count as prepared
        let err = prepare_sources(&config, &paths, &data, &Config::default(), false).unwrap_err();
        assert!(err.to_string().contains("sha256 mismatch"));
    }

    #[test]
    fn test_fingerprint_tracks_patches() {
        let spec = PatchSpec {
            file: "patches/0001-a.patch".to_string(),
            sha256: "AA".to_string(),
        };
        let bare = source_fingerprint("6.2", "ff", &[]);
        let patched = source_fingerprint("6.2", "ff", &[(PathBuf::from("/p"), &spec)]);

        assert_eq!(bare, "version=6.2\nsource=ff\n");
        assert!(patched.ends_with("patch=patches/0001-a.patch:aa\n"));
        assert_ne!(source_fingerprint("6.1", "ff", &[]), bare);
    }

    #[test]
    fn test_unknown_version_fails_before_fetch() {
        let tmp = TempDir::new().unwrap();
        let config = RecipeConfig::new(
            "5.9",
            OptionSet::default(),
            PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64"),
        );
        let paths = RecipePaths::under(tmp.path());
        let err = prepare_sources(
            &config,
            &paths,
            &RecipeData::bundled().unwrap(),
            &Config::default(),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no source registered"));
        assert!(!paths.source_dir.exists());
    }
}
