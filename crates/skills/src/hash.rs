//! Content hashing for unpublished-change detection.
//!
//! The digest is the sole signal for "has this skill changed since the last
//! publish". It deliberately ignores modification times and `.clawdhub`
//! bookkeeping so install metadata never produces false positives.

use std::path::Path;

use {
    sha2::{Digest, Sha256},
    walkdir::WalkDir,
};

/// Path segments excluded from hashing.
const EXCLUDED_SEGMENTS: &[&str] = &[".git", ".clawdhub"];

/// OS metadata file names excluded from hashing.
const EXCLUDED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Compute a deterministic digest over a skill's file tree.
///
/// Regular files are sorted by relative path (byte order) and fed to SHA-256
/// as `path, 0x00, contents, 0x00`. File contents participate only when they
/// decode as UTF-8; a change confined to a binary file's bytes is invisible
/// to the digest, though adding, removing, or renaming one is not. Failure to
/// enumerate the tree degrades to an empty digest rather than an error.
pub fn content_hash(root: &Path) -> String {
    let mut files: Vec<String> = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(root = %root.display(), %e, "hash enumeration failed");
                return String::new();
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if is_excluded(relative) {
            continue;
        }
        files.push(relative.to_string_lossy().into_owned());
    }
    files.sort();

    let mut hasher = Sha256::new();
    for relative in &files {
        hasher.update(relative.as_bytes());
        hasher.update([0u8]);
        if let Ok(bytes) = std::fs::read(root.join(relative))
            && std::str::from_utf8(&bytes).is_ok()
        {
            hasher.update(&bytes);
        }
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn is_excluded(relative: &Path) -> bool {
    for component in relative.components() {
        let name = component.as_os_str().to_string_lossy();
        if EXCLUDED_SEGMENTS.contains(&name.as_ref()) {
            return true;
        }
    }
    relative
        .file_name()
        .map(|n| EXCLUDED_NAMES.contains(&n.to_string_lossy().as_ref()))
        .unwrap_or(false)
}
