//! Names of installed ncurses artifacts.
//!
//! ncurses decorates everything it installs with a variant suffix: `t` for
//! reentrant builds, then `w` for wide-char builds.

use crate::core::options::OptionSet;
use crate::core::platform::PlatformDescriptor;

/// Libraries every build installs, in link order.
pub const BASE_LIBRARIES: &[&str] = &["form", "menu", "panel", "ncurses"];

/// The C++ binding, linked before everything else when present.
pub const CXX_LIBRARY: &str = "ncurses++";

/// Variant suffix: `""`, `"t"`, `"w"` or `"tw"`.
pub fn suffix(options: &OptionSet) -> String {
    let mut res = String::new();
    if options.with_reentrant {
        res.push('t');
    }
    if options.with_widec {
        res.push('w');
    }
    res
}

/// Suffix plus the import library decoration of shared Windows builds.
pub fn lib_suffix(options: &OptionSet, platform: &PlatformDescriptor) -> String {
    let mut res = suffix(options);
    if options.shared && platform.is_windows() {
        if let Some(ext) = platform.policy().import_lib_extension() {
            res.push_str(ext);
        }
    }
    res
}

/// Library names consumers link against, C++ binding first.
pub fn library_names(options: &OptionSet, platform: &PlatformDescriptor) -> Vec<String> {
    let lib_suffix = lib_suffix(options, platform);

    let mut libs = Vec::with_capacity(BASE_LIBRARIES.len() + 1);
    if options.with_cxx {
        libs.push(CXX_LIBRARY);
    }
    libs.extend(BASE_LIBRARIES.iter().copied());

    libs.into_iter()
        .map(|lib| format!("{}{}", lib, lib_suffix))
        .collect()
}

/// Header directory name under `include/` (`ncursestw`, ...).
pub fn include_subdir(options: &OptionSet) -> String {
    format!("ncurses{}", suffix(options))
}

/// File name of the config script ncurses installs into `bin/`.
pub fn config_script_name(options: &OptionSet, major_version: &str) -> String {
    format!("ncurses{}{}-config", suffix(options), major_version)
}
