//! Source acquisition: recipe data, tarballs, patches.

pub mod patch;
pub mod recipe_data;
pub mod tarball;

pub use patch::apply_patches;
pub use recipe_data::{PatchSpec, RecipeData, TarballSource};
pub use tarball::{extract_tarball, fetch_source};
