//! Translation of a recipe configuration into `configure` arguments.

use std::path::Path;

use serde::Serialize;

use crate::core::platform::{BuildType, Compiler, PlatformPolicy};
use crate::core::recipe::{RecipeConfig, RecipePaths};
use crate::util::fs::unix_path;

/// Flags passed to every configure run.
const FIXED_FLAGS: &[&str] = &[
    "--without-libtool",
    "--without-ada",
    "--without-manpages",
    "--without-tests",
    "--disable-echo",
    "--without-debug",
    "--without-profile",
    "--with-sp-funcs",
    "--disable-rpath",
];

const SHARED_FLAGS: &[&str] = &["--with-shared", "--without-normal", "--with-cxx-shared"];
const STATIC_FLAGS: &[&str] = &["--without-shared", "--with-normal", "--without-cxx-shared"];

/// Extra feature selection for Windows targets.
const WINDOWS_FLAGS: &[&str] = &[
    "--disable-macros",
    "--disable-termcap",
    "--enable-database",
    "--enable-sp-funcs",
    "--enable-term-driver",
    "--enable-interop",
];

/// Ordered arguments for the configure script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigureArgs {
    pub args: Vec<String>,
}

impl ConfigureArgs {
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.args.iter()
    }

    fn push(&mut self, arg: impl Into<String>) {
        self.args.push(arg.into());
    }

    fn extend(&mut self, args: &[&str]) {
        self.args.extend(args.iter().map(|a| a.to_string()));
    }
}

fn pick(enabled: bool, yes: &str, no: &str) -> String {
    if enabled { yes } else { no }.to_string()
}

/// Build the argument list for the configure step.
///
/// The result depends only on `config` and `paths`.
pub fn build_configure_args(config: &RecipeConfig, paths: &RecipePaths) -> ConfigureArgs {
    let opts = &config.options;
    let render = |path: &Path| render_path(config.policy, path);
    let prefix = &paths.package_dir;

    let mut args = ConfigureArgs::default();

    args.push(pick(opts.with_widec, "--enable-widec", "--disable-widec"));
    args.push(pick(opts.extended_colors(), "--enable-ext-colors", "--disable-ext-colors"));
    args.push(pick(opts.with_reentrant, "--enable-reentrant", "--disable-reentrant"));
    args.push(pick(opts.with_pcre2, "--with-pcre2", "--without-pcre2"));
    args.push(pick(opts.with_cxx, "--with-cxx-binding", "--without-cxx-binding"));
    args.push(pick(opts.with_progs, "--with-progs", "--without-progs"));

    args.extend(FIXED_FLAGS);
    args.push(format!(
        "--datarootdir={}",
        render(&prefix.join("bin").join("share"))
    ));
    args.push("--disable-pc-files");

    if opts.shared {
        args.extend(SHARED_FLAGS);
    } else {
        args.extend(STATIC_FLAGS);
    }

    if config.platform.is_windows() {
        args.extend(WINDOWS_FLAGS);
    }

    if config.policy.is_msvc() {
        args.push("ac_cv_func_getopt=yes");
    }

    args.push(format!("--prefix={}", render(prefix)));
    for (flag, dir) in [
        ("--bindir", "bin"),
        ("--sbindir", "bin"),
        ("--libexecdir", "bin"),
        ("--libdir", "lib"),
        ("--includedir", "include"),
        ("--oldincludedir", "include"),
    ] {
        args.push(format!("{}={}", flag, render(&prefix.join(dir))));
    }

    if let Some(triple) = cross_triple(config) {
        args.push(format!("--build={}", triple));
        args.push(format!("--host={}", triple));
    }

    args
}

/// Build/host triple used to drive cl.exe through configure.
pub fn cross_triple(config: &RecipeConfig) -> Option<String> {
    if config.policy.is_msvc() {
        Some(format!("{}-w64-mingw32-msvc7", config.platform.arch))
    } else {
        None
    }
}

fn render_path(policy: PlatformPolicy, path: &Path) -> String {
    if policy.is_windows() {
        unix_path(path)
    } else {
        path.display().to_string()
    }
}

/// Compiler and linker flags derived from the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompilerFlags {
    pub cflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub ldflags: Vec<String>,
}

impl CompilerFlags {
    /// Compute the flags for `config`.
    pub fn for_config(config: &RecipeConfig) -> Self {
        let mut common: Vec<String> = Vec::new();

        let msvc = config.policy.is_msvc();
        let build_type_flags: &[&str] = match (msvc, config.platform.build_type) {
            (false, BuildType::Debug) => &["-g"],
            (false, BuildType::Release) => &["-O3"],
            (false, BuildType::RelWithDebInfo) => &["-O2", "-g"],
            (false, BuildType::MinSizeRel) => &["-Os"],
            (true, BuildType::Debug) => &["-Zi", "-Ob0", "-Od"],
            (true, BuildType::Release) => &["-O2", "-Ob2"],
            (true, BuildType::RelWithDebInfo) => &["-Zi", "-O2", "-Ob1"],
            (true, BuildType::MinSizeRel) => &["-O1", "-Ob1"],
        };
        common.extend(build_type_flags.iter().map(|f| f.to_string()));
        if config.platform.build_type != BuildType::Debug {
            common.push("-DNDEBUG".to_string());
        }

        if config.options.fpic() {
            common.push("-fPIC".to_string());
        }

        let gnu_like = matches!(
            config.platform.compiler,
            Compiler::Gcc | Compiler::Clang | Compiler::AppleClang
        );
        if gnu_like {
            match config.platform.arch.as_str() {
                "x86" => common.push("-m32".to_string()),
                "x86_64" => common.push("-m64".to_string()),
                _ => {}
            }
        }

        let mut flags = CompilerFlags {
            cflags: common.clone(),
            cxxflags: common,
            ldflags: Vec::new(),
        };

        if msvc {
            flags.cflags.push("-FS".to_string());
            flags.cxxflags.push("-FS".to_string());
            flags.cxxflags.push("-EHsc".to_string());
        } else if gnu_like {
            match config.platform.arch.as_str() {
                "x86" => flags.ldflags.push("-m32".to_string()),
                "x86_64" => flags.ldflags.push("-m64".to_string()),
                _ => {}
            }
        }

        flags
    }

    /// Append user flags from configuration.
    pub fn with_extra(mut self, cflags: &[String], cxxflags: &[String], ldflags: &[String]) -> Self {
        self.cflags.extend(cflags.iter().cloned());
        self.cxxflags.extend(cxxflags.iter().cloned());
        self.ldflags.extend(ldflags.iter().cloned());
        self
    }

    /// Render as `CFLAGS`/`CXXFLAGS`/`LDFLAGS` environment entries.
    ///
    /// `LDFLAGS` is left out when empty so a toolchain's own value stays.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("CFLAGS".to_string(), self.cflags.join(" ")),
            ("CXXFLAGS".to_string(), self.cxxflags.join(" ")),
        ];
        if !self.ldflags.is_empty() {
            env.push(("LDFLAGS".to_string(), self.ldflags.join(" ")));
        }
        env
    }
}

#[cfg(test)]
impl ConfigureArgs {
    /// Whether `flag` is present verbatim.
    pub fn contains(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}
