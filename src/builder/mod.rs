//! Native build of ncurses.
//!
//! This module maps a recipe configuration onto configure arguments and
//! toolchain variables, drives autotools, and packages the result.

pub mod autotools;
pub mod configure;
pub mod package;
pub mod toolchain;

pub use autotools::{check_prerequisites, AutotoolsBuilder, BuildTools};
pub use configure::{build_configure_args, CompilerFlags, ConfigureArgs};
pub use package::{run_package, PackagePlan};
pub use toolchain::{build_toolchain_env, with_toolchain_scope, ToolchainEnv, ToolchainScope};
