//! Publish orchestration: version arithmetic and the external `clawdhub`
//! tool boundary.
//!
//! The tool is an opaque subprocess collaborator; its stdout/stderr are
//! treated as text and surfaced verbatim on failure. Invocation goes through
//! [`CommandRunner`] so orchestration is testable with a fake runner.

use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use {anyhow::Context, async_trait::async_trait, regex::Regex};

use crate::{hash::content_hash, publish_state::PublishStateStore, types::Skill};

/// Version published when no prior version exists or it fails to parse.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Executable name of the external publish/identity tool.
pub const PUBLISH_TOOL: &str = "clawdhub";

/// Fixed candidate install locations checked before falling back to PATH.
const TOOL_CANDIDATE_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

// ── Version arithmetic ───────────────────────────────────────────────────────

/// Which semver component a publish bumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

impl VersionBump {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patch" => Some(Self::Patch),
            "minor" => Some(Self::Minor),
            "major" => Some(Self::Major),
            _ => None,
        }
    }
}

/// Bump a `major.minor.patch` version. Returns `None` unless the input is
/// exactly three dot-separated non-negative integers. Pure and total.
pub fn bump_version(version: &str, bump: VersionBump) -> Option<String> {
    let parts: Vec<&str> = version.trim().split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let major: u64 = parts[0].parse().ok()?;
    let minor: u64 = parts[1].parse().ok()?;
    let patch: u64 = parts[2].parse().ok()?;

    Some(match bump {
        VersionBump::Major => format!("{}.0.0", major + 1),
        VersionBump::Minor => format!("{major}.{}.0", minor + 1),
        VersionBump::Patch => format!("{major}.{minor}.{}", patch + 1),
    })
}

/// Next version to publish: bump the previous one, or fall back to
/// [`INITIAL_VERSION`] when it is absent or malformed.
pub fn next_version(previous: Option<&str>, bump: VersionBump) -> String {
    previous
        .and_then(|v| bump_version(v, bump))
        .unwrap_or_else(|| INITIAL_VERSION.to_string())
}

// ── Command runner boundary ──────────────────────────────────────────────────

/// Captured output of a finished subprocess.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout and stderr joined, for error surfacing.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_string();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }
}

/// Runs external commands. Fake this to test orchestration without
/// subprocesses.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &Path, args: &[String]) -> anyhow::Result<CommandOutput>;
}

/// Default runner over `tokio::process`.
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> anyhow::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to run {}", program.display()))?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Locate the publish tool: fixed candidate locations first, then PATH.
pub fn resolve_tool_path() -> anyhow::Result<PathBuf> {
    for dir in TOOL_CANDIDATE_DIRS {
        let candidate = Path::new(dir).join(PUBLISH_TOOL);
        if candidate.is_file() && is_executable(&candidate) {
            return Ok(candidate);
        }
    }
    if let Ok(path_var) = std::env::var("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(PUBLISH_TOOL);
            if candidate.is_file() && is_executable(&candidate) {
                return Ok(candidate);
            }
        }
    }
    anyhow::bail!("{PUBLISH_TOOL} CLI not found; install it or add it to PATH")
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

// ── Publish / identity operations ────────────────────────────────────────────

/// The external publish/identity tool bound to a runner.
pub struct PublishTool<'a> {
    program: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> PublishTool<'a> {
    pub fn new(program: PathBuf, runner: &'a dyn CommandRunner) -> Self {
        Self { program, runner }
    }

    /// Resolve the tool from the fixed candidate list / PATH.
    pub fn resolve(runner: &'a dyn CommandRunner) -> anyhow::Result<Self> {
        Ok(Self::new(resolve_tool_path()?, runner))
    }

    /// Publish `skill` at `version`, persisting the content hash on success.
    ///
    /// Failure leaves the publish state untouched and carries the tool's
    /// combined output. Returns the published version.
    pub async fn publish(
        &self,
        store: &PublishStateStore,
        skill: &Skill,
        version: &str,
        changelog: Option<&str>,
        tags: &[String],
    ) -> anyhow::Result<String> {
        let mut args = vec![
            "publish".to_string(),
            skill.folder_path.display().to_string(),
            "--version".to_string(),
            version.to_string(),
        ];
        if let Some(changelog) = changelog {
            args.push("--changelog".to_string());
            args.push(changelog.to_string());
        }
        if !tags.is_empty() {
            args.push("--tags".to_string());
            args.push(tags.join(","));
        }

        let output = self.runner.run(&self.program, &args).await?;
        if !output.success {
            anyhow::bail!("publish of '{}' failed: {}", skill.name, output.combined());
        }

        let hash = content_hash(&skill.folder_path);
        store.save(&skill.name, &hash)?;
        tracing::info!(skill = %skill.name, %version, "published skill");
        Ok(version.to_string())
    }

    /// Identity check: last non-empty line of `whoami` output, ANSI-stripped.
    pub async fn whoami(&self) -> anyhow::Result<String> {
        let output = self.runner.run(&self.program, &["whoami".to_string()]).await?;
        if !output.success {
            anyhow::bail!("whoami failed: {}", output.combined());
        }
        strip_ansi(&output.stdout)
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .context("whoami produced no output")
    }
}

/// Remove ANSI escape sequences from terminal output.
#[allow(clippy::expect_used)]
pub fn strip_ansi(text: &str) -> String {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI
        .get_or_init(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI pattern"));
    re.replace_all(text, "").into_owned()
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::{SkillStats, MANIFEST_NAME},
        std::sync::Mutex,
    };

    #[test]
    fn test_bump_version() {
        assert_eq!(bump_version("1.2.3", VersionBump::Patch).as_deref(), Some("1.2.4"));
        assert_eq!(bump_version("1.2.3", VersionBump::Minor).as_deref(), Some("1.3.0"));
        assert_eq!(bump_version("1.2.3", VersionBump::Major).as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_bump_version_rejects_malformed() {
        assert!(bump_version("bad", VersionBump::Patch).is_none());
        assert!(bump_version("1.2", VersionBump::Patch).is_none());
        assert!(bump_version("1.2.3.4", VersionBump::Patch).is_none());
        assert!(bump_version("1.2.x", VersionBump::Patch).is_none());
        assert!(bump_version("-1.2.3", VersionBump::Patch).is_none());
    }

    #[test]
    fn test_next_version_fallback() {
        assert_eq!(next_version(None, VersionBump::Patch), "1.0.0");
        assert_eq!(next_version(Some("bad"), VersionBump::Patch), "1.0.0");
        assert_eq!(next_version(Some("0.3.9"), VersionBump::Minor), "0.4.0");
    }

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[32mlogged in as\x1b[0m \x1b[1malice\x1b[0m";
        assert_eq!(strip_ansi(colored), "logged in as alice");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    /// Records invocations; replies with a canned output.
    struct FakeRunner {
        output: CommandOutput,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeRunner {
        fn new(success: bool, stdout: &str, stderr: &str) -> Self {
            Self {
                output: CommandOutput {
                    success,
                    stdout: stdout.to_string(),
                    stderr: stderr.to_string(),
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, _program: &Path, args: &[String]) -> anyhow::Result<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(self.output.clone())
        }
    }

    fn skill_fixture(dir: &Path) -> Skill {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(MANIFEST_NAME), "---\nname: Demo\n---\n").unwrap();
        Skill {
            id: Skill::make_id("claude", "demo"),
            name: "demo".into(),
            display_name: "Demo".into(),
            description: String::new(),
            source_key: "claude".into(),
            folder_path: dir.to_path_buf(),
            manifest_path: dir.join(MANIFEST_NAME),
            references: Vec::new(),
            stats: SkillStats::default(),
        }
    }

    #[tokio::test]
    async fn test_publish_success_persists_hash() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_fixture(&tmp.path().join("demo"));
        let store = PublishStateStore::new(tmp.path().join("publish-state"));
        let runner = FakeRunner::new(true, "ok\n", "");
        let tool = PublishTool::new(PathBuf::from("/usr/bin/clawdhub"), &runner);

        let version = tool
            .publish(&store, &skill, "1.0.1", Some("fixes"), &["pdf".into(), "cli".into()])
            .await
            .unwrap();
        assert_eq!(version, "1.0.1");
        assert!(!store.needs_publish(&skill));

        let calls = runner.calls.lock().unwrap();
        let args = &calls[0];
        assert_eq!(args[0], "publish");
        assert_eq!(args[1], skill.folder_path.display().to_string());
        assert_eq!(&args[2..4], &["--version".to_string(), "1.0.1".to_string()]);
        assert!(args.windows(2).any(|w| w[0] == "--changelog" && w[1] == "fixes"));
        assert!(args.windows(2).any(|w| w[0] == "--tags" && w[1] == "pdf,cli"));
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_state_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_fixture(&tmp.path().join("demo"));
        let store = PublishStateStore::new(tmp.path().join("publish-state"));
        let runner = FakeRunner::new(false, "partial out", "registry rejected");
        let tool = PublishTool::new(PathBuf::from("/usr/bin/clawdhub"), &runner);

        let err = tool.publish(&store, &skill, "1.0.1", None, &[]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("partial out") && msg.contains("registry rejected"), "{msg}");
        assert!(store.load("demo").is_none());
    }

    #[tokio::test]
    async fn test_publish_omits_optional_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_fixture(&tmp.path().join("demo"));
        let store = PublishStateStore::new(tmp.path().join("publish-state"));
        let runner = FakeRunner::new(true, "", "");
        let tool = PublishTool::new(PathBuf::from("/usr/bin/clawdhub"), &runner);

        tool.publish(&store, &skill, "1.0.0", None, &[]).await.unwrap();
        let calls = runner.calls.lock().unwrap();
        assert!(!calls[0].iter().any(|a| a == "--changelog" || a == "--tags"));
    }

    #[tokio::test]
    async fn test_whoami_strips_ansi_and_takes_last_line() {
        let runner = FakeRunner::new(true, "banner\n\n\x1b[1malice@clawdhub\x1b[0m\n\n", "");
        let tool = PublishTool::new(PathBuf::from("/usr/bin/clawdhub"), &runner);
        assert_eq!(tool.whoami().await.unwrap(), "alice@clawdhub");
    }

    #[tokio::test]
    async fn test_whoami_failure_surfaces_output() {
        let runner = FakeRunner::new(false, "", "not logged in");
        let tool = PublishTool::new(PathBuf::from("/usr/bin/clawdhub"), &runner);
        let err = tool.whoami().await.unwrap_err();
        assert!(err.to_string().contains("not logged in"));
    }
}
