use thiserror::Error;
use tracing::debug;

use crate::config::ProjectDescriptor;
use crate::host::Host;

/// Token that marks a session as belonging to this tool
const TOOL_TOKEN: &str = "czarina";

/// Prefix of the positional window names (`worker1`, `worker2`, ...)
const POSITIONAL_WINDOW_PREFIX: &str = "worker";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaneError {
    #[error("no window for worker '{worker}' in session '{session}'")]
    WindowNotFound { worker: String, session: String },
    #[error("failed to capture {session}:{window}")]
    CaptureFailed { session: String, window: String },
}

/// Whether a session name belongs to the project
pub fn is_project_session(name: &str, slug: &str) -> bool {
    name.to_lowercase().contains(TOOL_TOKEN) || name.contains(slug)
}

pub fn is_daemon_session(name: &str) -> bool {
    name.contains("daemon")
}

/// Live sessions belonging to the project, in the order tmux reports them.
///
/// A failed listing (no server, nothing started yet) yields no sessions.
pub async fn discover_sessions<H: Host + ?Sized>(host: &H, slug: &str) -> Vec<String> {
    match host.list_sessions().await {
        Ok(sessions) => sessions
            .into_iter()
            .filter(|name| is_project_session(name, slug))
            .collect(),
        Err(e) => {
            debug!("session listing failed: {:#}", e);
            Vec::new()
        }
    }
}

/// Window name used for the Nth configured worker (1-based).
///
/// This ties window naming to configuration order, so reordering workers in
/// the config silently remaps windows.
pub fn positional_window_name(position: usize) -> String {
    format!("{}{}", POSITIONAL_WINDOW_PREFIX, position)
}

/// Pick the window for a worker: exact id first, then the positional name
pub fn resolve_window<'a>(
    descriptor: &ProjectDescriptor,
    worker_id: &str,
    windows: &'a [String],
) -> Option<&'a str> {
    if let Some(exact) = windows.iter().find(|w| *w == worker_id) {
        return Some(exact.as_str());
    }

    let candidate = positional_window_name(descriptor.position_of(worker_id)?);
    windows
        .iter()
        .find(|w| **w == candidate)
        .map(String::as_str)
}

/// Read the visible text of a worker's window in `session`
pub async fn read_worker_pane<H: Host + ?Sized>(
    host: &H,
    descriptor: &ProjectDescriptor,
    worker_id: &str,
    session: &str,
) -> Result<String, PaneError> {
    let not_found = || PaneError::WindowNotFound {
        worker: worker_id.to_string(),
        session: session.to_string(),
    };

    let windows = match host.list_windows(session).await {
        Ok(windows) => windows,
        Err(e) => {
            debug!(session, "window listing failed: {:#}", e);
            return Err(not_found());
        }
    };

    let window = resolve_window(descriptor, worker_id, &windows).ok_or_else(not_found)?;

    host.capture_pane(session, Some(window)).await.map_err(|e| {
        debug!(session, window, "capture failed: {:#}", e);
        PaneError::CaptureFailed {
            session: session.to_string(),
            window: window.to_string(),
        }
    })
}
