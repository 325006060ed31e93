use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProjectDescriptor;
use crate::daemon::{check_daemon, DaemonSnapshot};
use crate::git::{self, GitStatus};
use crate::host::Host;
use crate::tmux::{
    discover_sessions, is_daemon_session, read_worker_pane, PaneError, StateInferenceEngine,
    WorkerState,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub id: String,
    pub state: WorkerState,
    pub detail: String,
    pub git_status: GitStatus,
}

/// Point-in-time view of the whole project, rebuilt from scratch every tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Local>,
    /// One entry per configured worker, in configured order
    pub workers: Vec<WorkerSnapshot>,
    pub daemon: DaemonSnapshot,
    /// Live project sessions, daemon sessions excluded
    pub live_sessions: Vec<String>,
    /// Entries under the worktree root; `None` when it does not exist
    pub worktree_count: Option<usize>,
}

impl Snapshot {
    /// Number of workers currently in `state`
    pub fn count(&self, state: WorkerState) -> usize {
        self.workers.iter().filter(|w| w.state == state).count()
    }
}

/// Find and classify a worker's pane, trying sessions in priority order
async fn worker_state<H: Host + ?Sized>(
    host: &H,
    descriptor: &ProjectDescriptor,
    worker_id: &str,
    sessions: &[String],
) -> (WorkerState, String) {
    for session in sessions.iter().filter(|s| !is_daemon_session(s)) {
        match read_worker_pane(host, descriptor, worker_id, session).await {
            Ok(content) => {
                let (state, detail) = StateInferenceEngine::analyze(&content);
                return (state, detail.to_string());
            }
            Err(PaneError::WindowNotFound { .. }) => continue,
            Err(e @ PaneError::CaptureFailed { .. }) => {
                debug!(worker = worker_id, "{}", e);
                return (WorkerState::Error, String::new());
            }
        }
    }

    (WorkerState::NotFound, String::new())
}

fn count_worktrees<H: Host + ?Sized>(
    host: &H,
    descriptor: &ProjectDescriptor,
) -> Option<usize> {
    let root = descriptor.worktrees_root();
    if !host.dir_exists(&root) {
        return None;
    }

    match host.list_dir_entries(&root) {
        Ok(entries) => Some(entries.len()),
        Err(e) => {
            debug!(root = %root.display(), "worktree listing failed: {:#}", e);
            Some(0)
        }
    }
}

/// Aggregate one snapshot from already-discovered sessions
pub async fn build_snapshot<H: Host + ?Sized>(
    descriptor: &ProjectDescriptor,
    host: &H,
    sessions: &[String],
    now: DateTime<Local>,
) -> Snapshot {
    let mut workers = Vec::with_capacity(descriptor.workers.len());

    for worker in &descriptor.workers {
        let (state, detail) = worker_state(host, descriptor, &worker.id, sessions).await;
        let git_status = git::summarize(host, &descriptor.worktree_path(&worker.id)).await;

        workers.push(WorkerSnapshot {
            id: worker.id.clone(),
            state,
            detail,
            git_status,
        });
    }

    Snapshot {
        timestamp: now,
        workers,
        daemon: check_daemon(host, descriptor).await,
        live_sessions: sessions
            .iter()
            .filter(|s| !is_daemon_session(s))
            .cloned()
            .collect(),
        worktree_count: count_worktrees(host, descriptor),
    }
}

/// Run one full tick: discover sessions, then aggregate
pub async fn tick<H: Host + ?Sized>(
    descriptor: &ProjectDescriptor,
    host: &H,
    now: DateTime<Local>,
) -> Snapshot {
    let sessions = discover_sessions(host, &descriptor.slug).await;
    build_snapshot(descriptor, host, &sessions, now).await
}
