//! ncurses-recipe - configure, build and package ncurses from source
//!
//! This crate turns a set of recipe options and a target platform into an
//! autotools invocation for the ncurses C library, runs it, and describes
//! the installed package to downstream builds.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

pub use core::{
    errors::RecipeError, options::OptionSet, platform::PlatformDescriptor,
    platform::PlatformPolicy, recipe::RecipeConfig, recipe::RecipePaths,
};

pub use ops::{BuildPlan, PackageInfo};
pub use util::config::Config;
