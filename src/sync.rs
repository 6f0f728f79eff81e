//! Repository sync manager: keeps one shallow git working copy per source.
//!
//! Workflow per source:
//! 1. No working copy yet → `git clone --depth 1 --branch B --single-branch`.
//! 2. Working copy present → `git fetch --depth 1 origin B` then
//!    `git reset --hard FETCH_HEAD`.
//! 3. On failure, keep whatever working copy exists (stale beats missing);
//!    a failed first clone leaves the source out of this cycle.
//!
//! Every git invocation is bounded by a timeout and killed when it expires.
//! When `git` cannot be executed at all the manager is disabled and every
//! remote source is skipped.

use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::models::{Source, SyncStatus};

/// Environment variable consulted first when probing for a cache root.
pub const CACHE_DIR_ENV: &str = "DOCS_HARNESS_CACHE_DIR";

const PROBE_FILE: &str = ".write-probe";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("git is not available on PATH")]
    GitUnavailable,
    #[error("git {op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },
    #[error("git {op} failed: {stderr}")]
    GitFailed { op: &'static str, stderr: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A usable checkout produced by [`RepoSync::sync_source`].
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    pub path: PathBuf,
    pub status: SyncStatus,
    pub commit: Option<String>,
}

/// Owns the on-disk cache root and every working copy below it.
#[derive(Debug, Clone)]
pub struct RepoSync {
    cache_root: PathBuf,
    git_available: bool,
    clone_timeout: Duration,
    fetch_timeout: Duration,
    offline: bool,
}

impl RepoSync {
    /// Create a manager rooted at `cache_root`, probing for `git` once.
    pub async fn new(cache_root: PathBuf, config: &SyncConfig) -> Self {
        let git_available = git_available().await;
        if !git_available {
            warn!("git not found on PATH; remote documentation sources are disabled");
        }
        Self {
            cache_root,
            git_available,
            clone_timeout: Duration::from_secs(config.clone_timeout_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            offline: config.offline,
        }
    }

    /// A manager that never runs git, for local-only builds.
    pub fn disabled(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            git_available: false,
            clone_timeout: Duration::ZERO,
            fetch_timeout: Duration::ZERO,
            offline: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.git_available
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn working_copy_dir(&self, source: &Source) -> PathBuf {
        self.cache_root.join(&source.id)
    }

    /// Produce a usable working copy for `source`, or `None` if there is none.
    ///
    /// Never returns an error: every failure is logged and folded into the
    /// returned status.
    pub async fn sync_source(&self, source: &Source) -> Option<WorkingCopy> {
        if !self.git_available {
            return None;
        }

        let dir = self.working_copy_dir(source);
        let exists = dir.join(".git").exists();

        let status = if self.offline {
            if !exists {
                debug!(source = %source.id, "offline and no working copy; skipping");
                return None;
            }
            SyncStatus::Stale
        } else if exists {
            match self.update(&dir, &source.branch).await {
                Ok(()) => {
                    info!(source = %source.id, "updated working copy");
                    SyncStatus::Fresh
                }
                Err(e) => {
                    warn!(source = %source.id, error = %e, "sync failed; using existing working copy");
                    SyncStatus::Stale
                }
            }
        } else {
            match self.clone_fresh(&source.url, &source.branch, &dir).await {
                Ok(()) => {
                    info!(source = %source.id, url = %source.url, "cloned working copy");
                    SyncStatus::Fresh
                }
                Err(e) => {
                    warn!(source = %source.id, error = %e, "clone failed; skipping source");
                    if dir.exists() {
                        if let Err(e) = std::fs::remove_dir_all(&dir) {
                            warn!(source = %source.id, error = %e, "could not remove partial clone");
                        }
                    }
                    return None;
                }
            }
        };

        let commit = run_git(["rev-parse", "HEAD"], Some(&dir), "rev-parse", self.fetch_timeout)
            .await
            .ok();

        Some(WorkingCopy {
            path: dir,
            status,
            commit,
        })
    }

    async fn clone_fresh(&self, url: &str, branch: &str, dest: &Path) -> Result<(), SyncError> {
        std::fs::create_dir_all(&self.cache_root)?;
        let args = [
            OsStr::new("clone"),
            OsStr::new("--depth"),
            OsStr::new("1"),
            OsStr::new("--branch"),
            OsStr::new(branch),
            OsStr::new("--single-branch"),
            OsStr::new("--quiet"),
            OsStr::new(url),
            dest.as_os_str(),
        ];
        run_git(args, None, "clone", self.clone_timeout).await?;
        Ok(())
    }

    async fn update(&self, repo_dir: &Path, branch: &str) -> Result<(), SyncError> {
        run_git(
            ["fetch", "--depth", "1", "--quiet", "origin", branch],
            Some(repo_dir),
            "fetch",
            self.fetch_timeout,
        )
        .await?;
        run_git(
            ["reset", "--hard", "--quiet", "FETCH_HEAD"],
            Some(repo_dir),
            "reset",
            self.fetch_timeout,
        )
        .await?;
        Ok(())
    }
}

/// Whether `git --version` runs successfully.
pub async fn git_available() -> bool {
    run_git(["--version"], None, "version", Duration::from_secs(10))
        .await
        .is_ok()
}

async fn run_git<I, S>(
    args: I,
    cwd: Option<&Path>,
    op: &'static str,
    timeout: Duration,
) -> Result<String, SyncError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new("git");
    cmd.args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    debug!(op, cwd = ?cwd, "running git");

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(SyncError::Timeout {
                op,
                secs: timeout.as_secs(),
            })
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SyncError::GitUnavailable)
        }
        Ok(result) => result?,
    };

    if !output.status.success() {
        return Err(SyncError::GitFailed {
            op,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Resolve the cache root once at bootstrap.
///
/// An explicit directory is created and used as-is. Otherwise the first
/// writable candidate wins: `$DOCS_HARNESS_CACHE_DIR`, the platform cache
/// directory, `./.docs-cache`, then the system temp directory.
pub fn resolve_cache_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create cache dir {}", dir.display()))?;
        return Ok(dir.to_path_buf());
    }

    let candidates = default_cache_candidates();
    for candidate in &candidates {
        if probe_writable(candidate) {
            debug!("using cache root {}", candidate.display());
            return Ok(candidate.clone());
        }
        debug!("cache candidate {} is not writable", candidate.display());
    }

    bail!(
        "no writable cache directory among: {}",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn default_cache_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            candidates.push(PathBuf::from(trimmed));
        }
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "docs-harness") {
        candidates.push(dirs.cache_dir().join("repos"));
    }
    candidates.push(PathBuf::from(".docs-cache"));
    candidates.push(std::env::temp_dir().join("docs-harness"));
    candidates
}

fn probe_writable(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(PROBE_FILE);
    if std::fs::write(&probe, b"ok").is_err() {
        return false;
    }
    let _ = std::fs::remove_file(&probe);
    true
}

/// Build a browsable, branch-qualified URL for a file in a remote repository.
pub fn build_web_url(repo_url: &str, branch: &str, relative_path: &str) -> String {
    // git@github.com:org/repo.git → https://github.com/org/repo/blob/<branch>/<path>
    if let Some(rest) = repo_url.strip_prefix("git@github.com:") {
        let repo = rest.trim_end_matches(".git");
        return format!(
            "https://github.com/{}/blob/{}/{}",
            repo, branch, relative_path
        );
    }

    if repo_url.contains("github.com") {
        let base = repo_url.trim_end_matches('/').trim_end_matches(".git");
        return format!("{}/blob/{}/{}", base, branch, relative_path);
    }

    if let Some(rest) = repo_url.strip_prefix("git@gitlab.com:") {
        let repo = rest.trim_end_matches(".git");
        return format!(
            "https://gitlab.com/{}/-/blob/{}/{}",
            repo, branch, relative_path
        );
    }

    if repo_url.contains("gitlab.com") {
        let base = repo_url.trim_end_matches('/').trim_end_matches(".git");
        return format!("{}/-/blob/{}/{}", base, branch, relative_path);
    }

    format!(
        "{}/{}",
        repo_url.trim_end_matches('/').trim_end_matches(".git"),
        relative_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_github_https_url() {
        assert_eq!(
            build_web_url(
                "https://github.com/adcontextprotocol/adcp.git",
                "main",
                "docs/intro.md"
            ),
            "https://github.com/adcontextprotocol/adcp/blob/main/docs/intro.md"
        );
    }

    #[test]
    fn test_github_ssh_url() {
        assert_eq!(
            build_web_url("git@github.com:org/repo.git", "dev", "README.md"),
            "https://github.com/org/repo/blob/dev/README.md"
        );
    }

    #[test]
    fn test_gitlab_url() {
        assert_eq!(
            build_web_url("https://gitlab.com/org/repo.git", "main", "a/b.md"),
            "https://gitlab.com/org/repo/-/blob/main/a/b.md"
        );
    }

    #[test]
    fn test_other_url_falls_back_to_path_join() {
        assert_eq!(
            build_web_url("file:///srv/git/widget.git", "main", "README.md"),
            "file:///srv/git/widget/README.md"
        );
    }

    #[test]
    fn test_explicit_cache_root_is_created() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("cache");
        let resolved = resolve_cache_root(Some(&dir)).unwrap();
        assert_eq!(resolved, dir);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_probe_leaves_no_file_behind() {
        let tmp = TempDir::new().unwrap();
        assert!(probe_writable(tmp.path()));
        assert!(!tmp.path().join(PROBE_FILE).exists());
    }

    #[tokio::test]
    async fn test_disabled_manager_skips_sources() {
        let tmp = TempDir::new().unwrap();
        let sync = RepoSync::disabled(tmp.path().to_path_buf());
        let source = Source {
            id: "widget".into(),
            name: "Widget".into(),
            url: "https://github.com/example/widget.git".into(),
            branch: "main".into(),
            include: vec!["README.md".into()],
            description: String::new(),
        };
        assert!(!sync.is_enabled());
        assert!(sync.sync_source(&source).await.is_none());
    }
}
