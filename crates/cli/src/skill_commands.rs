use std::path::{Path, PathBuf};

use anyhow::Context;

use skilldeck_skills::{
    client::HttpRegistryClient,
    provenance,
    publish::{resolve_tool_path, PublishTool, TokioCommandRunner, VersionBump},
    publish_state::PublishStateStore,
    service::SkillService,
    types::{CustomSkillPath, PlatformSource, ScanLayout},
};

/// Build the service from the persisted config and the real home directory.
async fn load_service() -> anyhow::Result<SkillService> {
    let home = directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .context("could not determine the home directory")?;
    let mut layout = ScanLayout::new(home);

    let config = skilldeck_config::discover_and_load();
    for entry in config.custom_skill_paths {
        layout
            .custom_paths
            .push(CustomSkillPath::new(entry.path, entry.display_name));
    }

    let service = SkillService::new(layout, PublishStateStore::new(PublishStateStore::default_dir()));
    service.reload().await?;
    Ok(service)
}

fn registry(registry_url: &str) -> HttpRegistryClient {
    HttpRegistryClient::new(registry_url, skilldeck_config::data_dir().join("downloads"))
}

pub async fn list(platforms_only: bool) -> anyhow::Result<()> {
    let service = load_service().await?;
    let groups = if platforms_only {
        service.platform_groups().await
    } else {
        service.groups().await
    };

    if groups.is_empty() {
        println!("No skills found.");
        return Ok(());
    }
    for group in groups {
        let platforms: Vec<&str> = group.installed_platforms.iter().map(String::as_str).collect();
        let origin = if provenance::is_owned(&group.skill) {
            "owned"
        } else {
            "registry"
        };
        println!(
            "{:<28} {:<10} [{}]  {}",
            group.skill.display_name,
            origin,
            platforms.join(", "),
            group.skill.description
        );
    }
    Ok(())
}

pub async fn sources() -> anyhow::Result<()> {
    let service = load_service().await?;
    println!("Platform sources:");
    for source in PlatformSource::ALL {
        let roots = service.destination_roots(&[source]).await;
        println!("  {:<10} {}", source.storage_key(), roots[0].display());
    }

    let config = skilldeck_config::discover_and_load();
    if !config.custom_skill_paths.is_empty() {
        println!("Custom paths:");
        for entry in config.custom_skill_paths {
            println!(
                "  {:<10} {}",
                entry.display_name.as_deref().unwrap_or("-"),
                entry.path.display()
            );
        }
    }
    Ok(())
}

pub fn add_path(path: PathBuf, name: Option<String>) -> anyhow::Result<()> {
    if !path.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    let mut config = skilldeck_config::discover_and_load();
    if !config.add_custom_path(path.clone(), name) {
        anyhow::bail!("{} is already registered", path.display());
    }
    skilldeck_config::save_config(&config)?;
    println!("Added custom skill path {}", path.display());
    Ok(())
}

pub fn remove_path(path: &Path) -> anyhow::Result<()> {
    let mut config = skilldeck_config::discover_and_load();
    if !config.remove_custom_path(path) {
        anyhow::bail!("{} is not a registered custom path", path.display());
    }
    skilldeck_config::save_config(&config)?;
    println!("Removed custom skill path {}", path.display());
    Ok(())
}

pub fn list_paths() -> anyhow::Result<()> {
    let config = skilldeck_config::discover_and_load();
    if config.custom_skill_paths.is_empty() {
        println!("No custom skill paths registered.");
        return Ok(());
    }
    for entry in config.custom_skill_paths {
        println!(
            "{:<24} {}",
            entry.display_name.as_deref().unwrap_or("-"),
            entry.path.display()
        );
    }
    Ok(())
}

pub async fn install(
    registry_url: &str,
    slug: &str,
    version: Option<&str>,
    to: &[String],
) -> anyhow::Result<()> {
    let sources: Vec<PlatformSource> = to
        .iter()
        .map(|key| {
            PlatformSource::from_key(key)
                .with_context(|| format!("unknown platform '{key}'"))
        })
        .collect::<anyhow::Result<_>>()?;

    let service = load_service().await?;
    let destinations = service.destination_roots(&sources).await;
    let client = registry(registry_url);
    let installed = service.install(&client, slug, version, &destinations).await?;

    for path in installed {
        println!("Installed {}", path.display());
    }
    Ok(())
}

pub async fn remove(name: &str) -> anyhow::Result<()> {
    let service = load_service().await?;
    let count = service.remove(name).await?;
    println!("Removed {count} copies of '{name}'");
    Ok(())
}

pub async fn publish(
    registry_url: &str,
    name: &str,
    bump: &str,
    changelog: Option<&str>,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let bump = VersionBump::parse(bump)
        .with_context(|| format!("invalid bump '{bump}': expected patch, minor, or major"))?;
    let service = load_service().await?;
    let client = registry(registry_url);
    let tool_path = resolve_tool_path()?;

    let version = service
        .publish(&client, &TokioCommandRunner, tool_path, name, bump, changelog, &tags)
        .await?;
    println!("Published '{name}' as {version}");
    Ok(())
}

pub async fn status() -> anyhow::Result<()> {
    let service = load_service().await?;
    let owned = service.owned_skills().await;
    if owned.is_empty() {
        println!("No locally authored skills.");
        return Ok(());
    }
    for skill in owned {
        let state = if service.publish_store().needs_publish(&skill) {
            "unpublished changes"
        } else {
            "up to date"
        };
        println!("{:<28} {:<10} {}", skill.display_name, skill.source_key, state);
    }
    Ok(())
}

pub async fn whoami() -> anyhow::Result<()> {
    let runner = TokioCommandRunner;
    let tool = PublishTool::resolve(&runner)?;
    println!("{}", tool.whoami().await?);
    Ok(())
}
