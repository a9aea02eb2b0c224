//! Applying patches to extracted sources.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::sources::recipe_data::PatchSpec;
use crate::util::hash::{sha256_file, verify_sha256};
use crate::util::process::ProcessBuilder;

/// Verify and apply each patch in order.
pub fn apply_patches<'a>(
    patches: impl IntoIterator<Item = (std::path::PathBuf, &'a PatchSpec)>,
    source_dir: &Path,
) -> Result<()> {
    for (path, spec) in patches {
        if !path.exists() {
            bail!(
                "patch file not found: {} (expected at {})",
                spec.file,
                path.display()
            );
        }
        verify_sha256(&spec.file, &spec.sha256, &sha256_file(&path)?)?;
        apply_single_patch(&path, source_dir)?;
    }
    Ok(())
}

/// Apply one patch with `git apply`, checking first that it applies cleanly.
pub fn apply_single_patch(patch_path: &Path, source_dir: &Path) -> Result<()> {
    tracing::info!("Applying patch: {}", patch_path.display());

    let check = ProcessBuilder::new("git")
        .args(["apply", "--check"])
        .arg(patch_path)
        .cwd(source_dir)
        .exec()
        .context("failed to run git apply --check")?;
    if !check.status.success() {
        bail!(
            "patch '{}' will not apply cleanly:\n{}",
            patch_path.display(),
            String::from_utf8_lossy(&check.stderr)
        );
    }

    let apply = ProcessBuilder::new("git")
        .arg("apply")
        .arg(patch_path)
        .cwd(source_dir)
        .exec()
        .context("failed to run git apply")?;
    if !apply.status.success() {
        bail!(
            "failed to apply patch '{}':\n{}",
            patch_path.display(),
            String::from_utf8_lossy(&apply.stderr)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_patch_file() {
        let tmp = TempDir::new().unwrap();
        let spec = PatchSpec {
            file: "patches/0001-missing.patch".to_string(),
            sha256: "00".to_string(),
        };
        let err = apply_patches([(tmp.path().join(&spec.file), &spec)], tmp.path()).unwrap_err();
        assert!(err.to_string().contains("patch file not found"));
    }

    #[test]
    fn test_patch_hash_checked_before_apply() {
        let tmp = TempDir::new().unwrap();
        let patch = tmp.path().join("fix.patch");
        std::fs::write(&patch, "--- a/x\n+++ b/x\n").unwrap();
        let spec = PatchSpec {
            file: "fix.patch".to_string(),
            sha256: "0".repeat(64),
        };
        let err = apply_patches([(patch, &spec)], tmp.path()).unwrap_err();
        assert!(err.to_string().contains("sha256 mismatch"));
    }
}
