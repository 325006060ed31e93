use anyhow::{Context, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::host::DEFAULT_COMMAND_TIMEOUT;

/// Client for read-only git queries via CLI
pub struct GitClient {
    /// Path to git binary
    git_path: String,
    timeout: Duration,
}

impl GitClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            git_path: "git".to_string(),
            timeout,
        }
    }

    /// Run `git status --short` inside a worktree
    pub async fn short_status(&self, worktree: &Path) -> Result<String> {
        let child = Command::new(&self.git_path)
            .arg("-C")
            .arg(worktree)
            .args(["status", "--short"])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .with_context(|| format!("git status timed out in {}", worktree.display()))?
            .context("Failed to execute git status")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git status failed: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for GitClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient {
            git_path: "/nonexistent/git-binary".to_string(),
            timeout: Duration::from_secs(1),
        };
        assert!(client.short_status(dir.path()).await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_git_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let client = GitClient {
            git_path: crate::host::fake::sleeping_binary(dir.path())
                .to_string_lossy()
                .into_owned(),
            timeout: Duration::from_millis(200),
        };

        let started = std::time::Instant::now();
        let err = client.short_status(dir.path()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
