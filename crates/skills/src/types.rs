use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use {
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Prefix discriminating custom-path storage keys from platform keys.
pub const CUSTOM_KEY_PREFIX: &str = "custom-";

/// Manifest file name required at a skill directory's root.
pub const MANIFEST_NAME: &str = "SKILL.md";

/// Description substituted when a manifest provides none.
pub const DEFAULT_DESCRIPTION: &str = "No description provided.";

// ── Platform sources ─────────────────────────────────────────────────────────

/// A recognized tool integration with a canonical skill-storage path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformSource {
    Codex,
    Claude,
    Opencode,
    Gemini,
}

impl PlatformSource {
    pub const ALL: [PlatformSource; 4] = [
        PlatformSource::Codex,
        PlatformSource::Claude,
        PlatformSource::Opencode,
        PlatformSource::Gemini,
    ];

    /// Preference order used when picking a group representative.
    pub const PREFERENCE: [PlatformSource; 2] = [PlatformSource::Codex, PlatformSource::Claude];

    /// Stable storage key. Never starts with `custom-`.
    pub fn storage_key(self) -> &'static str {
        match self {
            PlatformSource::Codex => "codex",
            PlatformSource::Claude => "claude",
            PlatformSource::Opencode => "opencode",
            PlatformSource::Gemini => "gemini",
        }
    }

    /// Inverse of [`PlatformSource::storage_key`].
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.storage_key() == key)
    }

    /// Skill-storage path relative to a base directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            PlatformSource::Codex => ".codex/skills",
            PlatformSource::Claude => ".claude/skills",
            PlatformSource::Opencode => ".opencode/skills",
            PlatformSource::Gemini => ".gemini/skills",
        }
    }

    /// Resolve the skill root under `base` (the home directory by default,
    /// or a custom path that may itself contain platform-shaped subtrees).
    pub fn root_under(self, base: &Path) -> PathBuf {
        base.join(self.relative_path())
    }
}

// ── Custom skill paths ──────────────────────────────────────────────────────

/// A user-registered skill root, scanned like a platform root but keyed
/// distinctly. The id is process-lifetime-unique; only the path and display
/// name persist across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSkillPath {
    pub id: Uuid,
    pub path: PathBuf,
    pub display_name: String,
}

impl CustomSkillPath {
    pub fn new(path: PathBuf, display_name: Option<String>) -> Self {
        let display_name = display_name.unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });
        Self {
            id: Uuid::new_v4(),
            path,
            display_name,
        }
    }

    /// `custom-` + first 8 hex chars of the uuid, lowercase. Truncation
    /// collisions are accepted as negligible rather than enforced against.
    pub fn storage_key(&self) -> String {
        let simple = self.id.simple().to_string();
        format!("{CUSTOM_KEY_PREFIX}{}", &simple[..8])
    }
}

/// Reified scan configuration: every root the engine looks at, with no
/// ambient filesystem reads, so tests can point it at synthetic trees.
#[derive(Debug, Clone, Default)]
pub struct ScanLayout {
    /// Base for the fixed platform roots (the user's home directory).
    pub home: PathBuf,
    pub custom_paths: Vec<CustomSkillPath>,
}

impl ScanLayout {
    pub fn new(home: PathBuf) -> Self {
        Self {
            home,
            custom_paths: Vec::new(),
        }
    }

    /// Root directory for a platform source under this layout's home.
    pub fn platform_root(&self, source: PlatformSource) -> PathBuf {
        source.root_under(&self.home)
    }
}

// ── Skills ───────────────────────────────────────────────────────────────────

/// A reference document under a skill's `references/` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDoc {
    /// Stable identity: the document's absolute path.
    pub path: PathBuf,
    /// Human-friendly title derived from the file name.
    pub title: String,
}

/// Counts of the auxiliary subdirectory entries. Contents are counted, not
/// validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStats {
    pub references: usize,
    pub assets: usize,
    pub scripts: usize,
    pub templates: usize,
}

/// A discovered skill. Rebuilt on every scan; never mutated in place —
/// mutation happens through filesystem operations followed by a fresh scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique within a loaded set; derived from `(source_key, name)`.
    pub id: String,
    /// Directory basename; the cross-source grouping key.
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Platform storage key, or `custom-<8-hex>` for custom paths.
    pub source_key: String,
    pub folder_path: PathBuf,
    pub manifest_path: PathBuf,
    pub references: Vec<ReferenceDoc>,
    pub stats: SkillStats,
}

impl Skill {
    /// Deterministic id from the storage-scoped identity.
    pub fn make_id(source_key: &str, name: &str) -> String {
        format!("{source_key}:{name}")
    }

    /// Whether this skill came from a custom path rather than a platform root.
    pub fn is_custom(&self) -> bool {
        self.source_key.starts_with(CUSTOM_KEY_PREFIX)
    }
}

// ── Grouping output ──────────────────────────────────────────────────────────

/// Presentation-level aggregate of same-named skills across sources.
#[derive(Debug, Clone)]
pub struct LocalSkillGroup {
    pub id: String,
    /// The chosen representative's content.
    pub skill: Skill,
    /// Platform storage keys (never `custom-` keys) that carry this name,
    /// computed from the full unfiltered set.
    pub installed_platforms: BTreeSet<String>,
    /// Ids of every skill sharing this name, for delete operations.
    pub delete_ids: Vec<String>,
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_storage_keys_distinct_and_unprefixed() {
        let keys: Vec<_> = PlatformSource::ALL.iter().map(|s| s.storage_key()).collect();
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
        for key in keys {
            assert!(!key.starts_with(CUSTOM_KEY_PREFIX));
            assert_eq!(key, key.to_lowercase());
        }
    }

    #[test]
    fn platform_roots_distinct_under_any_base() {
        let base = Path::new("/some/base");
        let roots: Vec<_> = PlatformSource::ALL.iter().map(|s| s.root_under(base)).collect();
        let unique: std::collections::HashSet<_> = roots.iter().collect();
        assert_eq!(unique.len(), roots.len());
    }

    #[test]
    fn custom_storage_key_shape() {
        let custom = CustomSkillPath::new(PathBuf::from("/tmp/mine"), None);
        let key = custom.storage_key();
        assert!(key.starts_with(CUSTOM_KEY_PREFIX));
        assert_eq!(key.len(), CUSTOM_KEY_PREFIX.len() + 8);
        assert_eq!(key, key.to_lowercase());
        assert_eq!(custom.display_name, "mine");
    }

    #[test]
    fn custom_display_name_override() {
        let custom = CustomSkillPath::new(PathBuf::from("/tmp/mine"), Some("My Skills".into()));
        assert_eq!(custom.display_name, "My Skills");
    }

    #[test]
    fn same_name_different_sources_get_different_ids() {
        let custom = CustomSkillPath::new(PathBuf::from("/tmp/mine"), None);
        let a = Skill::make_id(PlatformSource::Claude.storage_key(), "pdf-tools");
        let b = Skill::make_id(&custom.storage_key(), "pdf-tools");
        assert_ne!(a, b);
    }
}
