//! Recipe error types.

use thiserror::Error;

/// Errors raised while turning user input into a build, or while running it.
///
/// Option combinations that make no sense are not errors: normalization
/// drops them silently. Everything here aborts the current invocation.
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("unknown option `{name}` (valid options: {valid})")]
    UnknownOption { name: String, valid: String },

    #[error("invalid value `{value}` for option `{name}`, expected True or False")]
    InvalidOptionValue { name: String, value: String },

    #[error("unknown setting `{name}` (valid settings: os, compiler, compiler.version, arch, build_type, compiler.libcxx, compiler.cppstd)")]
    UnknownSetting { name: String },

    #[error("invalid value `{value}` for setting `{name}`")]
    InvalidSettingValue { name: String, value: String },

    #[error("no source registered for ncurses version `{version}` (available: {available})")]
    UnknownVersion { version: String, available: String },

    #[error("missing build prerequisite `{tool}`: {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    #[error("{step} step failed: `{command}` exited with code {code:?}\n{stderr}")]
    BuildStepFailed {
        step: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("sha256 mismatch for {what}:\n  expected: {expected}\n  actual:   {actual}")]
    HashMismatch {
        what: String,
        expected: String,
        actual: String,
    },
}
