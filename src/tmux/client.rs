use anyhow::{Context, Result};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

use crate::host::DEFAULT_COMMAND_TIMEOUT;

/// Client for querying tmux via CLI
pub struct TmuxClient {
    /// Path to tmux binary
    tmux_path: String,
    /// Per-command timeout; expiry counts as a failed query
    timeout: Duration,
}

impl TmuxClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            tmux_path: "tmux".to_string(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output> {
        let child = Command::new(&self.tmux_path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        tokio::time::timeout(self.timeout, child)
            .await
            .with_context(|| format!("tmux {} timed out after {:?}", args[0], self.timeout))?
            .with_context(|| format!("Failed to execute tmux {}", args[0]))
    }

    async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tmux {} failed: {}", args[0], stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// List the names of all live sessions, in tmux's order
    pub async fn list_session_names(&self) -> Result<Vec<String>> {
        let stdout = self
            .run_checked(&["list-sessions", "-F", "#{session_name}"])
            .await?;
        Ok(non_empty_lines(&stdout))
    }

    /// List window names in a session
    pub async fn list_windows(&self, session: &str) -> Result<Vec<String>> {
        let stdout = self
            .run_checked(&["list-windows", "-t", session, "-F", "#{window_name}"])
            .await?;
        Ok(non_empty_lines(&stdout))
    }

    /// Check whether a session with this exact name exists
    pub async fn has_session(&self, session: &str) -> bool {
        let target = format!("={}", session);
        self.run(&["has-session", "-t", &target])
            .await
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Capture the visible part of a pane (no scrollback)
    pub async fn capture_pane(&self, session: &str, window: Option<&str>) -> Result<String> {
        let target = match window {
            Some(window) => format!("{}:{}", session, window),
            None => session.to_string(),
        };
        self.run_checked(&["capture-pane", "-p", "-t", &target]).await
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
