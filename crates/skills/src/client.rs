//! Remote registry collaborator.
//!
//! The engine consumes exactly two operations: download an archive for a
//! slug/version and look up the latest published version of a name. Response
//! schemas beyond those two fields are out of scope.

use std::path::PathBuf;

use {anyhow::Context, async_trait::async_trait};

/// Narrow interface over the remote registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Download the archive for `slug` (optionally pinned to `version`) and
    /// return the local path of the `.tar.gz`.
    async fn download(&self, slug: &str, version: Option<&str>) -> anyhow::Result<PathBuf>;

    /// Latest published version of `name`, or `None` when unpublished.
    async fn fetch_latest_version(&self, name: &str) -> anyhow::Result<Option<String>>;
}

/// HTTP-backed registry client.
pub struct HttpRegistryClient {
    base_url: String,
    client: reqwest::Client,
    download_dir: PathBuf,
}

impl HttpRegistryClient {
    pub fn new(base_url: impl Into<String>, download_dir: PathBuf) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            download_dir,
        }
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn download(&self, slug: &str, version: Option<&str>) -> anyhow::Result<PathBuf> {
        let version_segment = version.unwrap_or("latest");
        let url = format!("{}/api/skills/{slug}/download/{version_segment}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "skilldeck")
            .send()
            .await
            .with_context(|| format!("failed to reach registry for '{slug}'"))?;
        if !resp.status().is_success() {
            anyhow::bail!("failed to download '{slug}': HTTP {}", resp.status());
        }
        let bytes = resp.bytes().await?;

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let file_name = format!(
            "{}-{version_segment}.tar.gz",
            slug.rsplit('/').next().unwrap_or(slug)
        );
        let path = self.download_dir.join(file_name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::debug!(%slug, path = %path.display(), "downloaded skill archive");
        Ok(path)
    }

    async fn fetch_latest_version(&self, name: &str) -> anyhow::Result<Option<String>> {
        let url = format!("{}/api/skills/{name}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "skilldeck")
            .send()
            .await
            .with_context(|| format!("failed to reach registry for '{name}'"))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("failed to look up '{name}': HTTP {}", resp.status());
        }
        let value: serde_json::Value = resp.json().await?;
        Ok(value
            .get("latestVersion")
            .or_else(|| value.pointer("/latest/version"))
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}
