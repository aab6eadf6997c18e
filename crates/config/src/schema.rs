use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level skilldeck configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkilldeckConfig {
    /// User-registered skill roots scanned in addition to the platform roots.
    pub custom_skill_paths: Vec<CustomPathEntry>,
}

/// A persisted custom skill root. Runtime identity (uuid-derived storage key)
/// is assigned when the entry is loaded, not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPathEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SkilldeckConfig {
    pub fn add_custom_path(&mut self, path: PathBuf, display_name: Option<String>) -> bool {
        if self.custom_skill_paths.iter().any(|e| e.path == path) {
            return false;
        }
        self.custom_skill_paths.push(CustomPathEntry { path, display_name });
        true
    }

    pub fn remove_custom_path(&mut self, path: &std::path::Path) -> bool {
        let before = self.custom_skill_paths.len();
        self.custom_skill_paths.retain(|e| e.path != path);
        self.custom_skill_paths.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_custom_path_dedupes() {
        let mut cfg = SkilldeckConfig::default();
        assert!(cfg.add_custom_path(PathBuf::from("/tmp/a"), None));
        assert!(!cfg.add_custom_path(PathBuf::from("/tmp/a"), Some("A".into())));
        assert_eq!(cfg.custom_skill_paths.len(), 1);
    }

    #[test]
    fn remove_custom_path_reports_missing() {
        let mut cfg = SkilldeckConfig::default();
        cfg.add_custom_path(PathBuf::from("/tmp/a"), None);
        assert!(cfg.remove_custom_path(std::path::Path::new("/tmp/a")));
        assert!(!cfg.remove_custom_path(std::path::Path::new("/tmp/a")));
    }
}
