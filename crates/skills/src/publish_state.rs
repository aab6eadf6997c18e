//! Persisted publish state: one small JSON record per skill name.

use std::path::{Path, PathBuf};

use {
    serde::{Deserialize, Serialize},
    time::{format_description::well_known::Rfc3339, OffsetDateTime},
};

use crate::{hash::content_hash, types::Skill};

/// The hash and time of a skill's last successful publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishState {
    pub last_published_hash: String,
    /// RFC-3339 timestamp of the last publish.
    pub last_published_at: String,
}

/// Per-skill-name record files under an application-scoped directory.
/// Absence of a record means "never published".
pub struct PublishStateStore {
    dir: PathBuf,
}

impl PublishStateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Default store location under the application data directory.
    pub fn default_dir() -> PathBuf {
        skilldeck_config::data_dir().join("publish-state")
    }

    /// Load the record for `name`; missing or unreadable records are `None`.
    pub fn load(&self, name: &str) -> Option<PublishState> {
        let data = std::fs::read_to_string(self.record_path(name)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Persist the record whole, atomically via temp file + rename.
    pub fn save(&self, name: &str, hash: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let state = PublishState {
            last_published_hash: hash.to_string(),
            last_published_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
        };
        let path = self.record_path(name);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&state)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Whether the skill's current tree differs from its last published hash.
    /// Computed fresh on every call; never cached across scans.
    pub fn needs_publish(&self, skill: &Skill) -> bool {
        let current = content_hash(&skill.folder_path);
        match self.load(&skill.name) {
            Some(state) => state.last_published_hash != current,
            None => true,
        }
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}
