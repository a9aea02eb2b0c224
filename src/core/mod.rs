//! Core data model: options, platform, resolved configuration.

pub mod errors;
pub mod naming;
pub mod options;
pub mod platform;
pub mod profile;
pub mod recipe;
pub mod requirements;

pub use errors::RecipeError;
pub use options::OptionSet;
pub use platform::{BuildType, Compiler, Os, PlatformDescriptor, PlatformPolicy};
pub use profile::Profile;
pub use recipe::{RecipeConfig, RecipePaths};
pub use requirements::Requirement;
