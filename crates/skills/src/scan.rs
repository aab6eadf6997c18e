//! Filesystem scanning: turns a skill root into structured [`Skill`] records.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    parse::{self, title_case},
    types::{
        CustomSkillPath, PlatformSource, ReferenceDoc, Skill, SkillStats, DEFAULT_DESCRIPTION,
        MANIFEST_NAME,
    },
};

/// Auxiliary subdirectories counted per skill.
const REFERENCES_DIR: &str = "references";
const ASSETS_DIR: &str = "assets";
const SCRIPTS_DIR: &str = "scripts";
const TEMPLATES_DIR: &str = "templates";

/// Scan one root directory for skills, keyed by `source_key`.
///
/// A missing root yields an empty list, not an error; an existing root that
/// cannot be enumerated propagates the error. Directory symlinks on the root
/// are resolved before enumeration. Unreadable individual entries degrade to
/// defaulted fields.
pub fn scan_root(root: &Path, source_key: &str) -> anyhow::Result<Vec<Skill>> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    // Dereference a symlinked root so enumeration sees the real tree.
    let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    let entries = std::fs::read_dir(&root)
        .with_context(|| format!("failed to list skill root {}", root.display()))?;

    let mut skills = Vec::new();
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let manifest = dir.join(MANIFEST_NAME);
        if !manifest.is_file() {
            continue;
        }
        skills.push(read_skill(&dir, &manifest, source_key));
    }

    // read_dir order is platform-dependent; keep the output deterministic.
    skills.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(skills)
}

/// Scan a custom path: its direct children plus any platform-shaped subtrees
/// it contains, all under the custom storage key. Duplicate ids within the
/// same custom path keep the first-encountered record.
pub fn scan_custom_path(custom: &CustomSkillPath) -> anyhow::Result<Vec<Skill>> {
    let key = custom.storage_key();
    let mut skills = scan_root(&custom.path, &key)?;

    for source in PlatformSource::ALL {
        let nested = source.root_under(&custom.path);
        match scan_root(&nested, &key) {
            Ok(found) => {
                for skill in found {
                    if !skills.iter().any(|s| s.id == skill.id) {
                        skills.push(skill);
                    }
                }
            },
            Err(e) => {
                tracing::warn!(path = %nested.display(), %e, "skipping unreadable nested root");
            },
        }
    }
    Ok(skills)
}

/// Build one skill record from a manifest-bearing directory.
fn read_skill(dir: &Path, manifest: &Path, source_key: &str) -> Skill {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let text = match std::fs::read_to_string(manifest) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(manifest = %manifest.display(), %e, "unreadable manifest, using defaults");
            String::new()
        },
    };
    let meta = parse::parse_manifest(&text);

    Skill {
        id: Skill::make_id(source_key, &name),
        display_name: meta.name.unwrap_or_else(|| title_case(&name)),
        description: meta
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        source_key: source_key.to_string(),
        folder_path: dir.to_path_buf(),
        manifest_path: manifest.to_path_buf(),
        references: collect_references(dir),
        stats: SkillStats {
            references: count_entries(&dir.join(REFERENCES_DIR)),
            assets: count_entries(&dir.join(ASSETS_DIR)),
            scripts: count_entries(&dir.join(SCRIPTS_DIR)),
            templates: count_entries(&dir.join(TEMPLATES_DIR)),
        },
        name,
    }
}

/// Markdown documents directly under `references/`, sorted case-insensitively
/// by derived title.
fn collect_references(dir: &Path) -> Vec<ReferenceDoc> {
    let refs_dir = dir.join(REFERENCES_DIR);
    let entries = match std::fs::read_dir(&refs_dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut docs: Vec<ReferenceDoc> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if !path.is_file() || !is_markdown(&path) {
                return None;
            }
            let stem = path.file_stem()?.to_string_lossy().into_owned();
            Some(ReferenceDoc {
                title: title_case(&stem),
                path,
            })
        })
        .collect();

    docs.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
    docs
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
    )
}

/// Entry count of a subdirectory; missing or unreadable counts as zero.
fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|e| e.flatten().count()).unwrap_or(0)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, name: &str, manifest: &str) -> PathBuf {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_NAME), manifest).unwrap();
        dir
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let skills = scan_root(Path::new("/nonexistent/skills"), "claude").unwrap();
        assert!(skills.is_empty());
    }

    #[test]
    fn test_scan_finds_manifest_dirs_only() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(
            tmp.path(),
            "my-skill",
            "---\nname: My Skill\ndescription: Does things\n---\n",
        );
        std::fs::create_dir_all(tmp.path().join("not-a-skill")).unwrap();
        std::fs::write(tmp.path().join("stray-file.md"), "hello").unwrap();

        let skills = scan_root(tmp.path(), "claude").unwrap();
        assert_eq!(skills.len(), 1);
        let skill = &skills[0];
        assert_eq!(skill.name, "my-skill");
        assert_eq!(skill.display_name, "My Skill");
        assert_eq!(skill.description, "Does things");
        assert_eq!(skill.id, "claude:my-skill");
        assert_eq!(skill.source_key, "claude");
    }

    #[test]
    fn test_scan_defaults_for_bare_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "pdf-tools", "no structure at all\n");

        let skills = scan_root(tmp.path(), "codex").unwrap();
        assert_eq!(skills[0].display_name, "Pdf Tools");
        assert_eq!(skills[0].description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_scan_counts_and_references_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_skill(tmp.path(), "demo", "---\nname: Demo\n---\n");
        std::fs::create_dir_all(dir.join("references")).unwrap();
        std::fs::create_dir_all(dir.join("scripts")).unwrap();
        std::fs::write(dir.join("references/zeta-notes.md"), "z").unwrap();
        std::fs::write(dir.join("references/Alpha_guide.md"), "a").unwrap();
        std::fs::write(dir.join("references/ignored.txt"), "not md").unwrap();
        std::fs::write(dir.join("scripts/run.sh"), "#!/bin/sh\n").unwrap();

        let skills = scan_root(tmp.path(), "claude").unwrap();
        let skill = &skills[0];
        assert_eq!(skill.stats.references, 3);
        assert_eq!(skill.stats.scripts, 1);
        assert_eq!(skill.stats.assets, 0);
        let titles: Vec<_> = skill.references.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha Guide", "Zeta Notes"]);
    }

    #[test]
    fn test_scan_resolves_symlinked_root() {
        #[cfg(unix)]
        {
            let tmp = tempfile::tempdir().unwrap();
            let real = tmp.path().join("real");
            write_skill(&real, "linked", "---\nname: Linked\n---\n");
            let link = tmp.path().join("link");
            std::os::unix::fs::symlink(&real, &link).unwrap();

            let skills = scan_root(&link, "claude").unwrap();
            assert_eq!(skills.len(), 1);
            assert_eq!(skills[0].display_name, "Linked");
        }
    }

    #[test]
    fn test_scan_custom_path_includes_platform_subtrees() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "direct", "---\nname: Direct\n---\n");
        let nested = tmp.path().join(".claude/skills");
        write_skill(&nested, "nested", "---\nname: Nested\n---\n");

        let custom = CustomSkillPath::new(tmp.path().to_path_buf(), None);
        let key = custom.storage_key();
        let skills = scan_custom_path(&custom).unwrap();

        assert_eq!(skills.len(), 2);
        assert!(skills.iter().all(|s| s.source_key == key));
        assert!(skills.iter().all(|s| s.is_custom()));
    }

    #[test]
    fn test_scan_custom_path_dedupes_by_id() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "dup", "---\nname: Direct Copy\n---\n");
        let nested = tmp.path().join(".codex/skills");
        write_skill(&nested, "dup", "---\nname: Nested Copy\n---\n");

        let custom = CustomSkillPath::new(tmp.path().to_path_buf(), None);
        let skills = scan_custom_path(&custom).unwrap();
        assert_eq!(skills.len(), 1);
        // Direct children win over nested platform subtrees.
        assert_eq!(skills[0].display_name, "Direct Copy");
    }
}
