mod client;

pub use client::GitClient;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::host::Host;

/// Uncommitted-change summary of a worker's worktree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GitStatus {
    Clean,
    NoWorktree,
    GitError,
    Changed { modified: usize, added: usize },
}

impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitStatus::Clean => write!(f, "Clean"),
            GitStatus::NoWorktree => write!(f, "No worktree"),
            GitStatus::GitError => write!(f, "Git error"),
            GitStatus::Changed { modified, added } => write!(f, "{}M {}A", modified, added),
        }
    }
}

/// Summarize `git status --short` output.
///
/// Only modified (` M`, `M `) and added/untracked (`A `, `??`) lines are
/// counted; every other status code is dropped.
pub fn parse_short_status(output: &str) -> GitStatus {
    let output = output.trim_end();
    if output.trim().is_empty() {
        return GitStatus::Clean;
    }

    let mut modified = 0;
    let mut added = 0;
    for line in output.lines() {
        if line.starts_with(" M") || line.starts_with("M ") {
            modified += 1;
        } else if line.starts_with("A ") || line.starts_with("??") {
            added += 1;
        }
    }

    GitStatus::Changed { modified, added }
}

/// Compute the status of the worktree at `path`
pub async fn summarize<H: Host + ?Sized>(host: &H, path: &Path) -> GitStatus {
    if !host.dir_exists(path) {
        return GitStatus::NoWorktree;
    }

    match host.git_short_status(path).await {
        Ok(output) => parse_short_status(&output),
        Err(e) => {
            debug!(path = %path.display(), "git status failed: {:#}", e);
            GitStatus::GitError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_parse_clean() {
        assert_eq!(parse_short_status(""), GitStatus::Clean);
        assert_eq!(parse_short_status("\n  \n"), GitStatus::Clean);
    }

    #[test]
    fn test_parse_changes() {
        assert_eq!(
            parse_short_status(" M file.py\n?? new.py\n"),
            GitStatus::Changed {
                modified: 1,
                added: 1
            }
        );
    }

    #[test]
    fn test_parse_drops_other_codes() {
        let output = "M  staged.rs\nMM both.rs\n D gone.rs\nR  old -> new\nA  fresh.rs\n";
        assert_eq!(
            parse_short_status(output),
            GitStatus::Changed {
                modified: 1,
                added: 1
            }
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(GitStatus::Clean.to_string(), "Clean");
        assert_eq!(
            GitStatus::Changed {
                modified: 3,
                added: 2
            }
            .to_string(),
            "3M 2A"
        );
    }

    #[tokio::test]
    async fn test_summarize() {
        let host = FakeHost::new()
            .git_output("/wt/clean", "")
            .git_output("/wt/dirty", " M a.rs\n")
            .git_failure("/wt/broken");

        assert_eq!(
            summarize(&host, Path::new("/wt/missing")).await,
            GitStatus::NoWorktree
        );
        assert_eq!(
            summarize(&host, Path::new("/wt/clean")).await,
            GitStatus::Clean
        );
        assert_eq!(
            summarize(&host, Path::new("/wt/dirty")).await,
            GitStatus::Changed {
                modified: 1,
                added: 0
            }
        );
        assert_eq!(
            summarize(&host, Path::new("/wt/broken")).await,
            GitStatus::GitError
        );
    }
}
