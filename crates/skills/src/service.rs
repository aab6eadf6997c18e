//! The single owner of the loaded skill list.
//!
//! Scanning, hashing, and subprocess-driven operations run off the caller's
//! task and report back here; state transitions are serialized so a reload
//! replaces the whole list atomically and concurrent reload requests queue
//! rather than interleave.

use std::path::PathBuf;

use {
    anyhow::Context,
    tokio::sync::{Mutex, RwLock},
};

use crate::{
    client::RegistryClient,
    group, install, provenance,
    publish::{next_version, CommandRunner, PublishTool, VersionBump},
    publish_state::PublishStateStore,
    scan,
    types::{CustomSkillPath, LocalSkillGroup, PlatformSource, ScanLayout, Skill},
};

pub struct SkillService {
    layout: RwLock<ScanLayout>,
    skills: RwLock<Vec<Skill>>,
    /// Serializes full reloads; the list is never partially visible.
    reload_lock: Mutex<()>,
    publish_store: PublishStateStore,
}

impl SkillService {
    pub fn new(layout: ScanLayout, publish_store: PublishStateStore) -> Self {
        Self {
            layout: RwLock::new(layout),
            skills: RwLock::new(Vec::new()),
            reload_lock: Mutex::new(()),
            publish_store,
        }
    }

    pub fn publish_store(&self) -> &PublishStateStore {
        &self.publish_store
    }

    /// Rescan every root and replace the skill list.
    ///
    /// On failure the previously loaded list stays in place and the error
    /// carries a human-readable message naming the root that failed.
    pub async fn reload(&self) -> anyhow::Result<()> {
        let _guard = self.reload_lock.lock().await;
        let layout = self.layout.read().await.clone();

        let scanned = tokio::task::spawn_blocking(move || scan_all(&layout)).await??;

        *self.skills.write().await = scanned;
        Ok(())
    }

    /// Snapshot of the loaded set.
    pub async fn skills(&self) -> Vec<Skill> {
        self.skills.read().await.clone()
    }

    /// Groups over the full loaded set.
    pub async fn groups(&self) -> Vec<LocalSkillGroup> {
        let skills = self.skills.read().await;
        group::group_skills(&skills, &skills)
    }

    /// Groups over platform-root skills only. Custom-path entries are
    /// filtered out before grouping so they cannot become representatives.
    pub async fn platform_groups(&self) -> Vec<LocalSkillGroup> {
        let skills = self.skills.read().await;
        let visible: Vec<Skill> = skills.iter().filter(|s| !s.is_custom()).cloned().collect();
        group::group_skills(&visible, &skills)
    }

    /// Skills eligible for publishing.
    pub async fn owned_skills(&self) -> Vec<Skill> {
        self.skills
            .read()
            .await
            .iter()
            .filter(|s| provenance::is_owned(s))
            .cloned()
            .collect()
    }

    /// Register a custom root for subsequent reloads. Returns the runtime
    /// identity (uuid storage key) assigned to it.
    pub async fn add_custom_path(
        &self,
        path: PathBuf,
        display_name: Option<String>,
    ) -> CustomSkillPath {
        let custom = CustomSkillPath::new(path, display_name);
        self.layout.write().await.custom_paths.push(custom.clone());
        custom
    }

    /// Unregister a custom root by path. Returns whether anything changed.
    pub async fn remove_custom_path(&self, path: &std::path::Path) -> bool {
        let mut layout = self.layout.write().await;
        let before = layout.custom_paths.len();
        layout.custom_paths.retain(|c| c.path != path);
        layout.custom_paths.len() != before
    }

    /// Destination roots for the given platform sources under this layout.
    pub async fn destination_roots(&self, sources: &[PlatformSource]) -> Vec<PathBuf> {
        let layout = self.layout.read().await;
        sources.iter().map(|s| layout.platform_root(*s)).collect()
    }

    /// Download a skill from the registry and install it into each
    /// destination, then reload.
    pub async fn install(
        &self,
        client: &dyn RegistryClient,
        slug: &str,
        version: Option<&str>,
        destinations: &[PathBuf],
    ) -> anyhow::Result<Vec<PathBuf>> {
        let archive = client
            .download(slug, version)
            .await
            .with_context(|| format!("download of '{slug}' failed"))?;
        let installed = install::install_archive(&archive, slug, version, destinations).await?;
        self.reload().await?;
        Ok(installed)
    }

    /// Delete every copy of `name` across sources, then reload.
    pub async fn remove(&self, name: &str) -> anyhow::Result<usize> {
        let paths: Vec<PathBuf> = {
            let skills = self.skills.read().await;
            skills
                .iter()
                .filter(|s| s.name == name)
                .map(|s| s.folder_path.clone())
                .collect()
        };
        if paths.is_empty() {
            anyhow::bail!("no skill named '{name}' is loaded");
        }
        let count = paths.len();
        install::remove_skills(&paths).await?;
        self.reload().await?;
        Ok(count)
    }

    /// Publish an owned skill: resolve the next version from the registry's
    /// last known one, invoke the external tool, record the published hash.
    pub async fn publish(
        &self,
        client: &dyn RegistryClient,
        runner: &dyn CommandRunner,
        tool_path: PathBuf,
        name: &str,
        bump: VersionBump,
        changelog: Option<&str>,
        tags: &[String],
    ) -> anyhow::Result<String> {
        let skill = {
            let skills = self.skills.read().await;
            skills
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .with_context(|| format!("no skill named '{name}' is loaded"))?
        };
        if !provenance::is_owned(&skill) {
            anyhow::bail!("'{name}' was installed from the registry and cannot be published");
        }

        let previous = client.fetch_latest_version(name).await?;
        let version = next_version(previous.as_deref(), bump);

        let tool = PublishTool::new(tool_path, runner);
        tool.publish(&self.publish_store, &skill, &version, changelog, tags)
            .await
    }
}

/// Scan every platform root and custom path in the layout.
fn scan_all(layout: &ScanLayout) -> anyhow::Result<Vec<Skill>> {
    let mut skills = Vec::new();
    for source in PlatformSource::ALL {
        let root = layout.platform_root(source);
        skills.extend(scan::scan_root(&root, source.storage_key())?);
    }
    for custom in &layout.custom_paths {
        skills.extend(scan::scan_custom_path(custom)?);
    }
    Ok(skills)
}
