//! High-level operations

pub mod package_info;
pub mod recipe_build;

pub use package_info::{export_info, PackageInfo};
pub use recipe_build::{build, BuildOutcome, BuildPlan, BuildRequest};
