//! Recipe options.
//!
//! Options are the user-facing switches of the ncurses build. Two of them
//! can be removed entirely when they do not apply: `fPIC` (Windows targets,
//! shared builds) and `with_extended_colors` (builds without wide-char
//! support). A removed option is represented as `None`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::RecipeError;
use crate::core::platform::PlatformDescriptor;

/// Names of every option the recipe understands, in declaration order.
pub const OPTION_NAMES: &[&str] = &[
    "shared",
    "fPIC",
    "with_widec",
    "with_extended_colors",
    "with_cxx",
    "with_progs",
    "with_reentrant",
    "with_pcre2",
];

/// The option set for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub shared: bool,
    #[serde(rename = "fPIC", default, skip_serializing_if = "Option::is_none")]
    pub fpic: Option<bool>,
    pub with_widec: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_extended_colors: Option<bool>,
    pub with_cxx: bool,
    pub with_progs: bool,
    pub with_reentrant: bool,
    pub with_pcre2: bool,
}

impl Default for OptionSet {
    fn default() -> Self {
        OptionSet {
            shared: false,
            fpic: Some(true),
            with_widec: true,
            with_extended_colors: Some(true),
            with_cxx: true,
            with_progs: true,
            with_reentrant: false,
            with_pcre2: false,
        }
    }
}

impl OptionSet {
    /// Default options for a platform. `fPIC` does not exist on Windows.
    pub fn declare(platform: &PlatformDescriptor) -> Self {
        let mut options = OptionSet::default();
        if platform.is_windows() {
            options.fpic = None;
        }
        options
    }

    /// Extended colors, treating a removed option as off.
    pub fn extended_colors(&self) -> bool {
        self.with_extended_colors.unwrap_or(false)
    }

    /// Position-independent code, treating a removed option as off.
    pub fn fpic(&self) -> bool {
        self.fpic.unwrap_or(false)
    }

    /// Set an option from its textual form.
    ///
    /// Setting a removed option brings it back; normalization decides
    /// whether it survives.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), RecipeError> {
        let parsed = parse_bool(value).ok_or_else(|| RecipeError::InvalidOptionValue {
            name: name.to_string(),
            value: value.to_string(),
        })?;

        match name {
            "shared" => self.shared = parsed,
            "fPIC" | "fpic" => self.fpic = Some(parsed),
            "with_widec" => self.with_widec = parsed,
            "with_extended_colors" => self.with_extended_colors = Some(parsed),
            "with_cxx" => self.with_cxx = parsed,
            "with_progs" => self.with_progs = parsed,
            "with_reentrant" => self.with_reentrant = parsed,
            "with_pcre2" => self.with_pcre2 = parsed,
            _ => {
                return Err(RecipeError::UnknownOption {
                    name: name.to_string(),
                    valid: OPTION_NAMES.join(", "),
                })
            }
        }
        Ok(())
    }

    /// Parse and apply a `name=value` pair.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), RecipeError> {
        let (name, value) =
            assignment
                .split_once('=')
                .ok_or_else(|| RecipeError::InvalidOptionValue {
                    name: assignment.to_string(),
                    value: String::new(),
                })?;
        self.set(name.trim(), value.trim())
    }

    /// Present options as `(name, value)` pairs; removed options are skipped.
    pub fn entries(&self) -> Vec<(&'static str, bool)> {
        let mut entries = vec![("shared", self.shared)];
        if let Some(fpic) = self.fpic {
            entries.push(("fPIC", fpic));
        }
        entries.push(("with_widec", self.with_widec));
        if let Some(ext) = self.with_extended_colors {
            entries.push(("with_extended_colors", ext));
        }
        entries.extend([
            ("with_cxx", self.with_cxx),
            ("with_progs", self.with_progs),
            ("with_reentrant", self.with_reentrant),
            ("with_pcre2", self.with_pcre2),
        ]);
        entries
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries()
            .into_iter()
            .map(|(name, value)| format!("{}={}", name, if value { "True" } else { "False" }))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Drop option combinations that do not apply.
///
/// Invalid combinations are removed, never rejected. Applying this twice
/// gives the same result as applying it once.
pub fn normalize_options(options: &OptionSet, platform: &PlatformDescriptor) -> OptionSet {
    let mut normalized = *options;
    if options.shared || platform.is_windows() {
        normalized.fpic = None;
    }
    if !options.with_widec {
        normalized.with_extended_colors = None;
    }
    normalized
}

/// Drop platform settings that only matter to the C++ binding.
pub fn normalize_platform(options: &OptionSet, platform: &PlatformDescriptor) -> PlatformDescriptor {
    if options.with_cxx {
        platform.clone()
    } else {
        platform.without_cxx_settings()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{Compiler, Os};

    fn linux() -> PlatformDescriptor {
        PlatformDescriptor::new(Os::Linux, Compiler::Gcc, "x86_64")
    }

    fn windows() -> PlatformDescriptor {
        PlatformDescriptor::new(Os::Windows, Compiler::Msvc, "x86_64")
    }

    /// Every option set reachable by toggling the boolean options,
    /// with the removable options either present or removed.
    fn all_option_sets() -> Vec<OptionSet> {
        let mut sets = Vec::new();
        for bits in 0u32..(1 << 8) {
            let bit = |n: u32| bits & (1 << n) != 0;
            sets.push(OptionSet {
                shared: bit(0),
                fpic: if bit(1) { Some(bit(7)) } else { None },
                with_widec: bit(2),
                with_extended_colors: if bit(3) { Some(true) } else { None },
                with_cxx: bit(4),
                with_progs: bit(5),
                with_reentrant: bit(6),
                with_pcre2: bit(7),
            });
        }
        sets
    }

    #[test]
    fn test_declare_removes_fpic_on_windows() {
        assert_eq!(OptionSet::declare(&linux()).fpic, Some(true));
        assert_eq!(OptionSet::declare(&windows()).fpic, None);
    }

    #[test]
    fn test_defaults() {
        let options = OptionSet::declare(&linux());
        assert!(!options.shared);
        assert!(options.with_widec);
        assert_eq!(options.with_extended_colors, Some(true));
        assert!(options.with_cxx);
        assert!(options.with_progs);
        assert!(!options.with_reentrant);
        assert!(!options.with_pcre2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for platform in [linux(), windows()] {
            for options in all_option_sets() {
                let once = normalize_options(&options, &platform);
                let twice = normalize_options(&once, &platform);
                assert_eq!(once, twice, "not idempotent for {:?}", options);
            }
        }
    }

    #[test]
    fn test_normalize_drops_extended_colors_without_widec() {
        for options in all_option_sets() {
            let normalized = normalize_options(&options, &linux());
            if !options.with_widec {
                assert_eq!(normalized.with_extended_colors, None);
            } else {
                assert_eq!(normalized.with_extended_colors, options.with_extended_colors);
            }
        }
    }

    #[test]
    fn test_normalize_drops_fpic_when_shared() {
        let options = OptionSet {
            shared: true,
            ..OptionSet::default()
        };
        assert_eq!(normalize_options(&options, &linux()).fpic, None);
        assert_eq!(
            normalize_options(&OptionSet::default(), &linux()).fpic,
            Some(true)
        );
    }

    #[test]
    fn test_normalize_platform_drops_cxx_settings() {
        let mut platform = linux();
        platform.libcxx = Some("libstdc++11".to_string());
        platform.cppstd = Some("17".to_string());

        let with_cxx = normalize_platform(&OptionSet::default(), &platform);
        assert_eq!(with_cxx.libcxx.as_deref(), Some("libstdc++11"));

        let options = OptionSet {
            with_cxx: false,
            ..OptionSet::default()
        };
        let without_cxx = normalize_platform(&options, &platform);
        assert!(without_cxx.libcxx.is_none());
        assert!(without_cxx.cppstd.is_none());
    }

    #[test]
    fn test_set_options() {
        let mut options = OptionSet::default();
        options.apply_assignment("shared=True").unwrap();
        options.apply_assignment("with_widec = false").unwrap();
        options.set("fPIC", "0").unwrap();

        assert!(options.shared);
        assert!(!options.with_widec);
        assert_eq!(options.fpic, Some(false));

        assert!(matches!(
            options.set("with_ada", "True"),
            Err(RecipeError::UnknownOption { .. })
        ));
        assert!(matches!(
            options.set("shared", "maybe"),
            Err(RecipeError::InvalidOptionValue { .. })
        ));
        assert!(options.apply_assignment("shared").is_err());
    }

    #[test]
    fn test_display_skips_removed_options() {
        let options = OptionSet {
            fpic: None,
            with_widec: false,
            with_extended_colors: None,
            ..OptionSet::default()
        };
        let shown = options.to_string();
        assert!(!shown.contains("fPIC"));
        assert!(!shown.contains("with_extended_colors"));
        assert!(shown.contains("with_widec=False"));
    }
}
