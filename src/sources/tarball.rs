//! Tarball download, caching and extraction.

use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use url::Url;

use crate::sources::recipe_data::TarballSource;
use crate::util::fs::ensure_dir;
use crate::util::hash::{sha256_bytes, sha256_file, verify_sha256};

/// Where a tarball comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    /// Classify a source URL. Anything that is not a URL is a local path.
    pub fn parse(url: &str) -> Result<Self> {
        match Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "file" => {
                let path = parsed
                    .to_file_path()
                    .map_err(|_| anyhow::anyhow!("invalid file URL: {}", url))?;
                Ok(Location::Local(path))
            }
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Ok(Location::Remote(parsed))
            }
            // Windows drive letters parse as a one-letter scheme
            Ok(parsed) if parsed.scheme().len() == 1 => Ok(Location::Local(PathBuf::from(url))),
            Ok(parsed) => bail!("unsupported URL scheme `{}` in {}", parsed.scheme(), url),
            Err(_) => Ok(Location::Local(PathBuf::from(url))),
        }
    }
}

/// Fetch the tarball into `cache_dir` (keyed by hash) and return its path.
///
/// A cached copy whose hash still matches is reused without touching the
/// network.
pub fn fetch_tarball(source: &TarballSource, cache_dir: &Path, offline: bool) -> Result<PathBuf> {
    let location = Location::parse(&source.url)?;

    if let Location::Local(ref path) = location {
        let actual = sha256_file(path)?;
        verify_sha256(&source.url, &source.sha256, &actual)?;
        return Ok(path.clone());
    }

    ensure_dir(cache_dir)?;
    let cached = cache_dir.join(format!("{}.tar.gz", source.sha256.to_lowercase()));
    if cached.exists() {
        if sha256_file(&cached)?.eq_ignore_ascii_case(&source.sha256) {
            tracing::debug!("using cached tarball {}", cached.display());
            return Ok(cached);
        }
        tracing::warn!("discarding corrupt cached tarball {}", cached.display());
        std::fs::remove_file(&cached)
            .with_context(|| format!("failed to remove {}", cached.display()))?;
    }

    if offline {
        bail!(
            "tarball {} is not cached and network access is disabled (net.offline)",
            source.url
        );
    }

    tracing::info!("Downloading {}", source.url);

    let response = reqwest::blocking::get(source.url.as_str())
        .with_context(|| format!("failed to download tarball from {}", source.url))?;
    if !response.status().is_success() {
        bail!(
            "failed to download tarball from {}: HTTP {}",
            source.url,
            response.status()
        );
    }
    let bytes = response
        .bytes()
        .with_context(|| "failed to read tarball response body")?;

    verify_sha256(&source.url, &source.sha256, &sha256_bytes(&bytes))?;

    let mut tmp = tempfile::NamedTempFile::new_in(cache_dir)?;
    tmp.write_all(&bytes)?;
    tmp.persist(&cached)
        .with_context(|| format!("failed to store {}", cached.display()))?;

    Ok(cached)
}

/// Fetch and extract a source tarball into `dest`.
pub fn fetch_source(
    source: &TarballSource,
    dest: &Path,
    cache_dir: &Path,
    offline: bool,
) -> Result<()> {
    let tarball = fetch_tarball(source, cache_dir, offline)?;
    let data = std::fs::read(&tarball)
        .with_context(|| format!("failed to read {}", tarball.display()))?;

    extract_tarball(&data, dest, source.strip_prefix.as_deref())
        .with_context(|| format!("failed to extract tarball from {}", source.url))?;

    tracing::info!("Extracted sources to {}", dest.display());
    Ok(())
}

/// Extract a gzip-compressed tarball to a destination directory.
///
/// If `strip_prefix` is provided, that leading directory is removed from
/// every entry and from hard link targets. Entries, link targets and
/// symlink targets that would land outside `dest` are rejected, and nothing
/// is written through a symlink.
pub fn extract_tarball(data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    use flate2::read::GzDecoder;
    use std::io::Cursor;
    use tar::Archive;

    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = Archive::new(decoder);

    ensure_dir(dest)?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();
        let normalized = entry_path.to_string_lossy().replace('\\', "/");

        let Some(relative) = strip_entry_path(&normalized, strip_prefix) else {
            continue;
        };
        if !is_contained(&relative) {
            bail!("tarball entry escapes destination directory: {}", normalized);
        }
        ensure_no_symlink_ancestor(dest, &relative)?;

        let output_path = dest.join(&relative);
        if let Some(parent) = output_path.parent() {
            ensure_dir(parent)?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => ensure_dir(&output_path)?,
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                remove_existing(&output_path)?;
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            tar::EntryType::Link => {
                let target = entry
                    .link_name()?
                    .with_context(|| format!("hard link without target: {}", normalized))?
                    .to_string_lossy()
                    .replace('\\', "/");
                let target_rel = strip_entry_path(&target, strip_prefix)
                    .filter(|t| is_contained(t))
                    .with_context(|| {
                        format!("hard link target escapes destination directory: {}", target)
                    })?;
                ensure_no_symlink_ancestor(dest, &target_rel)?;

                remove_existing(&output_path)?;
                std::fs::hard_link(dest.join(&target_rel), &output_path).with_context(|| {
                    format!("failed to create hard link: {}", output_path.display())
                })?;
            }
            tar::EntryType::Symlink => {
                let target = entry
                    .link_name()?
                    .with_context(|| format!("symlink without target: {}", normalized))?
                    .into_owned();
                if resolve_symlink_target(&relative, &target).is_none() {
                    bail!(
                        "symlink escapes destination directory: {} -> {}",
                        normalized,
                        target.display()
                    );
                }

                #[cfg(unix)]
                {
                    remove_existing(&output_path)?;
                    std::os::unix::fs::symlink(&target, &output_path).with_context(|| {
                        format!("failed to create symlink: {}", output_path.display())
                    })?;
                }
                #[cfg(windows)]
                {
                    tracing::debug!("Skipping symlink on Windows: {}", normalized);
                }
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    normalized
                );
            }
        }
    }

    Ok(())
}

/// Apply `strip_prefix` to an archive path. `None` for the prefix directory
/// itself and for empty paths.
fn strip_entry_path(path: &str, strip_prefix: Option<&str>) -> Option<PathBuf> {
    let relative = match strip_prefix {
        Some(prefix) => {
            let prefix = prefix.trim_end_matches('/');
            if path.trim_end_matches('/') == prefix {
                return None;
            }
            path.strip_prefix(&format!("{}/", prefix)).unwrap_or(path)
        }
        None => path,
    };
    if relative.is_empty() {
        None
    } else {
        Some(PathBuf::from(relative))
    }
}

/// Whether a relative path only descends.
fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Resolve a symlink target lexically against the link's directory.
///
/// Returns the target relative to the extraction root, or `None` if it is
/// absolute or climbs above the root.
fn resolve_symlink_target(link: &Path, target: &Path) -> Option<PathBuf> {
    let mut resolved: Vec<&std::ffi::OsStr> = link
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(name) => Some(name),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    for component in target.components() {
        match component {
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved.iter().collect())
}

/// Refuse paths whose parent directories include a symlink.
fn ensure_no_symlink_ancestor(dest: &Path, relative: &Path) -> Result<()> {
    let mut current = dest.to_path_buf();
    let Some(parent) = relative.parent() else {
        return Ok(());
    };
    for component in parent.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                bail!(
                    "refusing to extract through symlink: {}",
                    current.display()
                );
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
    Ok(())
}

fn remove_existing(path: &Path) -> Result<()> {
    if std::fs::symlink_metadata(path).is_ok() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
    }
    Ok(())
}
