mod skill_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
};

#[derive(Parser)]
#[command(name = "skilldeck", about = "Skilldeck — multi-platform skill manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom data directory (overrides the default data dir).
    #[arg(long, global = true, env = "SKILLDECK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Registry base URL.
    #[arg(
        long,
        global = true,
        env = "SKILLDECK_REGISTRY_URL",
        default_value = "https://clawdhub.com"
    )]
    registry_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List skills grouped across platforms and custom paths.
    List {
        /// Group platform-root skills only.
        #[arg(long)]
        platforms_only: bool,
    },
    /// Show the scanned roots: platform sources and custom paths.
    Sources,
    /// Custom skill path management.
    Paths {
        #[command(subcommand)]
        action: PathAction,
    },
    /// Install a skill from the registry.
    Install {
        /// Registry slug, e.g. `owner/pdf-tools`.
        slug: String,
        /// Pin a version instead of the latest.
        #[arg(long)]
        version: Option<String>,
        /// Destination platforms (comma-separated storage keys).
        #[arg(long, value_delimiter = ',', default_value = "codex,claude")]
        to: Vec<String>,
    },
    /// Delete every copy of a skill across sources.
    Remove { name: String },
    /// Publish an owned skill to the registry.
    Publish {
        name: String,
        /// Version bump: patch, minor, or major.
        #[arg(long, default_value = "patch")]
        bump: String,
        #[arg(long)]
        changelog: Option<String>,
        /// Tag labels (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Show owned skills and whether they have unpublished changes.
    Status,
    /// Show the registry identity reported by the publish tool.
    Whoami,
}

#[derive(Subcommand)]
enum PathAction {
    /// Register a directory as a custom skill root.
    Add {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
    },
    /// Unregister a custom skill root.
    Remove { path: PathBuf },
    /// List registered custom skill roots.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    if let Some(dir) = &cli.data_dir {
        skilldeck_config::set_data_dir(dir.clone());
    }

    match cli.command {
        Commands::List { platforms_only } => skill_commands::list(platforms_only).await,
        Commands::Sources => skill_commands::sources().await,
        Commands::Paths { action } => match action {
            PathAction::Add { path, name } => skill_commands::add_path(path, name),
            PathAction::Remove { path } => skill_commands::remove_path(&path),
            PathAction::List => skill_commands::list_paths(),
        },
        Commands::Install { slug, version, to } => {
            skill_commands::install(&cli.registry_url, &slug, version.as_deref(), &to).await
        },
        Commands::Remove { name } => skill_commands::remove(&name).await,
        Commands::Publish {
            name,
            bump,
            changelog,
            tags,
        } => skill_commands::publish(&cli.registry_url, &name, &bump, changelog.as_deref(), tags).await,
        Commands::Status => skill_commands::status().await,
        Commands::Whoami => skill_commands::whoami().await,
    }
}

fn init_tracing(log_level: &str, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("skilldeck={log_level}")));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
