use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::git::GitClient;
use crate::tmux::TmuxClient;

/// Default upper bound on a single tmux or git invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only services the status engine queries on every tick
#[async_trait]
pub trait Host: Send + Sync {
    /// Names of all live tmux sessions
    async fn list_sessions(&self) -> Result<Vec<String>>;
    /// Window names within a session
    async fn list_windows(&self, session: &str) -> Result<Vec<String>>;
    async fn has_session(&self, session: &str) -> bool;
    /// Visible pane text; `None` targets the session's active window
    async fn capture_pane(&self, session: &str, window: Option<&str>) -> Result<String>;
    /// Output of `git status --short` in `path`
    async fn git_short_status(&self, path: &Path) -> Result<String>;
    fn dir_exists(&self, path: &Path) -> bool;
    fn list_dir_entries(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Host backed by the tmux and git CLIs and the local filesystem
pub struct SystemHost {
    tmux: TmuxClient,
    git: GitClient,
}

impl SystemHost {
    pub fn new(command_timeout: Duration) -> Self {
        Self {
            tmux: TmuxClient::with_timeout(command_timeout),
            git: GitClient::with_timeout(command_timeout),
        }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self {
            tmux: TmuxClient::new(),
            git: GitClient::new(),
        }
    }
}

#[async_trait]
impl Host for SystemHost {
    async fn list_sessions(&self) -> Result<Vec<String>> {
        self.tmux.list_session_names().await
    }

    async fn list_windows(&self, session: &str) -> Result<Vec<String>> {
        self.tmux.list_windows(session).await
    }

    async fn has_session(&self, session: &str) -> bool {
        self.tmux.has_session(session).await
    }

    async fn capture_pane(&self, session: &str, window: Option<&str>) -> Result<String> {
        self.tmux.capture_pane(session, window).await
    }

    async fn git_short_status(&self, path: &Path) -> Result<String> {
        self.git.short_status(path).await
    }

    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir_entries(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read directory {}", path.display()))?;
        entries
            .map(|entry| entry.map(|e| e.path()).map_err(anyhow::Error::from))
            .collect()
    }
}
