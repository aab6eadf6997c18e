//! Provenance markers for registry-installed skills.
//!
//! A skill installed from the registry carries
//! `<skill>/.clawdhub/origin.json`; locally authored skills have none.
//! Ownership (publish eligibility) is decided from this marker alone for
//! platform-root skills; custom-path skills are always owned.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::Skill;

/// Directory holding install bookkeeping inside a skill.
pub const PROVENANCE_DIR: &str = ".clawdhub";
/// Provenance file name inside [`PROVENANCE_DIR`].
pub const PROVENANCE_FILE: &str = "origin.json";
/// Source marker written into every provenance file.
pub const PROVENANCE_SOURCE: &str = "clawdhub";
/// Version sentinel when the installed version is unknown.
pub const LATEST_VERSION: &str = "latest";

/// Origin record for a registry-installed skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub slug: String,
    pub version: String,
    pub source: String,
    /// Unix seconds at install time.
    pub installed_at: u64,
}

impl Provenance {
    pub fn new(slug: &str, version: Option<&str>) -> Self {
        Self {
            slug: slug.to_string(),
            version: version.unwrap_or(LATEST_VERSION).to_string(),
            source: PROVENANCE_SOURCE.to_string(),
            installed_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }
}

fn provenance_path(skill_root: &Path) -> PathBuf {
    skill_root.join(PROVENANCE_DIR).join(PROVENANCE_FILE)
}

/// Write the provenance file beside installed content.
pub fn write_provenance(skill_root: &Path, provenance: &Provenance) -> anyhow::Result<()> {
    let path = provenance_path(skill_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, serde_json::to_string_pretty(provenance)?)?;
    Ok(())
}

/// Read the provenance file, if any. Unreadable or malformed files count as
/// absent.
pub fn read_provenance(skill_root: &Path) -> Option<Provenance> {
    let data = std::fs::read_to_string(provenance_path(skill_root)).ok()?;
    serde_json::from_str(&data).ok()
}

/// Whether a skill was authored locally and is eligible for publishing.
///
/// Custom-path skills are unconditionally owned; provenance tracking only
/// applies within recognized platform roots.
pub fn is_owned(skill: &Skill) -> bool {
    skill.is_custom() || read_provenance(&skill.folder_path).is_none()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::{SkillStats, MANIFEST_NAME},
    };

    fn skill_at(dir: &Path, source_key: &str) -> Skill {
        Skill {
            id: Skill::make_id(source_key, "demo"),
            name: "demo".into(),
            display_name: "Demo".into(),
            description: String::new(),
            source_key: source_key.into(),
            folder_path: dir.to_path_buf(),
            manifest_path: dir.join(MANIFEST_NAME),
            references: Vec::new(),
            stats: SkillStats::default(),
        }
    }

    #[test]
    fn test_write_and_read_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let prov = Provenance::new("owner/pdf-tools", Some("1.2.0"));
        write_provenance(tmp.path(), &prov).unwrap();

        let loaded = read_provenance(tmp.path()).unwrap();
        assert_eq!(loaded.slug, "owner/pdf-tools");
        assert_eq!(loaded.version, "1.2.0");
        assert_eq!(loaded.source, PROVENANCE_SOURCE);
        assert!(loaded.installed_at > 0);
    }

    #[test]
    fn test_missing_version_uses_latest_sentinel() {
        let prov = Provenance::new("owner/x", None);
        assert_eq!(prov.version, LATEST_VERSION);
    }

    #[test]
    fn test_file_uses_camel_case_keys() {
        let tmp = tempfile::tempdir().unwrap();
        write_provenance(tmp.path(), &Provenance::new("a/b", None)).unwrap();
        let raw =
            std::fs::read_to_string(tmp.path().join(PROVENANCE_DIR).join(PROVENANCE_FILE)).unwrap();
        assert!(raw.contains("installedAt"));
        assert!(raw.contains("\"source\": \"clawdhub\""));
    }

    #[test]
    fn test_platform_skill_ownership_follows_provenance() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_at(tmp.path(), "claude");
        assert!(is_owned(&skill));

        write_provenance(tmp.path(), &Provenance::new("a/b", None)).unwrap();
        assert!(!is_owned(&skill));
    }

    #[test]
    fn test_custom_skill_always_owned() {
        let tmp = tempfile::tempdir().unwrap();
        write_provenance(tmp.path(), &Provenance::new("a/b", None)).unwrap();
        let skill = skill_at(tmp.path(), "custom-1a2b3c4d");
        assert!(is_owned(&skill));
    }
}
