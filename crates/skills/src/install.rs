//! Install orchestration: extract a downloaded archive and copy the skill
//! into each destination root.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;

use crate::{
    provenance::{write_provenance, Provenance},
    types::MANIFEST_NAME,
};

/// Install an already-downloaded `.tar.gz` archive into every destination
/// root, writing a provenance file beside each copy.
///
/// Destinations are mutated independently and in order: a failure on one
/// returns the first error and leaves earlier successes in place — there is
/// no cross-destination rollback, and untried destinations are untouched.
/// Returns the installed skill directories on full success.
pub async fn install_archive(
    archive: &Path,
    slug: &str,
    version: Option<&str>,
    destinations: &[PathBuf],
) -> anyhow::Result<Vec<PathBuf>> {
    if destinations.is_empty() {
        anyhow::bail!("no destination roots selected for '{slug}'");
    }

    let archive = archive.to_path_buf();
    let slug = slug.to_string();
    let version = version.map(str::to_string);
    let destinations = destinations.to_vec();

    tokio::task::spawn_blocking(move || {
        // Scoped temp dir: extraction artifacts are removed on drop whether
        // the install succeeds or fails.
        let staging = tempfile::tempdir().context("failed to create extraction directory")?;
        extract_archive(&archive, staging.path())
            .with_context(|| format!("failed to extract {}", archive.display()))?;
        let skill_root = resolve_skill_root(staging.path())?;

        let install_name = slug.rsplit('/').next().unwrap_or(&slug).to_string();
        let mut installed = Vec::new();
        for dest in &destinations {
            std::fs::create_dir_all(dest)
                .with_context(|| format!("failed to create destination {}", dest.display()))?;
            let target = dest.join(&install_name);
            if target.exists() {
                std::fs::remove_dir_all(&target).with_context(|| {
                    format!("failed to replace existing skill at {}", target.display())
                })?;
            }
            copy_dir(&skill_root, &target)
                .with_context(|| format!("failed to copy skill into {}", target.display()))?;
            write_provenance(&target, &Provenance::new(&slug, version.as_deref()))?;
            installed.push(target);
        }

        tracing::info!(%slug, count = installed.len(), "installed skill");
        Ok(installed)
    })
    .await?
}

/// Delete skill directories (a group's delete set). The first error stops
/// the sweep; earlier removals stand.
pub async fn remove_skills(paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        if !path.exists() {
            continue;
        }
        tokio::fs::remove_dir_all(path)
            .await
            .with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Unpack a gzip tarball into `target`, skipping link entries and rejecting
/// unsafe paths.
fn extract_archive(archive: &Path, target: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::open(archive)?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut tar = tar::Archive::new(decoder);

    for entry in tar.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type().is_symlink() || entry.header().entry_type().is_hard_link() {
            tracing::warn!(archive = %archive.display(), "skipping symlink/hardlink archive entry");
            continue;
        }

        let path = entry.path()?.into_owned();
        let Some(sanitized) = sanitize_archive_path(&path)? else {
            continue;
        };

        let dest = target.join(&sanitized);
        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        entry.unpack(&dest)?;
    }
    Ok(())
}

/// Validate an archive entry path. Rejects parent/root components; drops
/// empty paths.
fn sanitize_archive_path(path: &Path) -> anyhow::Result<Option<PathBuf>> {
    if path.as_os_str().is_empty() {
        return Ok(None);
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                anyhow::bail!("archive contains unsafe path component: {}", path.display());
            },
        }
    }
    Ok(Some(path.to_path_buf()))
}

/// Locate the skill directory inside an extracted tree: the extraction root
/// itself when it carries a manifest, otherwise the unique manifest-bearing
/// immediate subdirectory. Zero or multiple candidates is a fatal
/// ambiguous-structure error for this install.
fn resolve_skill_root(extracted: &Path) -> anyhow::Result<PathBuf> {
    if extracted.join(MANIFEST_NAME).is_file() {
        return Ok(extracted.to_path_buf());
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(extracted)?.flatten() {
        let dir = entry.path();
        if dir.is_dir() && dir.join(MANIFEST_NAME).is_file() {
            candidates.push(dir);
        }
    }

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => anyhow::bail!("archive contains no {MANIFEST_NAME}"),
        n => anyhow::bail!("ambiguous archive: {n} directories contain {MANIFEST_NAME}"),
    }
}

/// Recursive copy preserving the tree shape. Symlinks are not followed.
fn copy_dir(from: &Path, to: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            copy_dir(&source, &dest)?;
        } else if file_type.is_file() {
            std::fs::copy(&source, &dest)?;
        }
    }
    Ok(())
}
