use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProjectDescriptor;
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DaemonState {
    Running,
    Stopped,
}

impl DaemonState {
    pub fn label(self) -> &'static str {
        match self {
            DaemonState::Running => "Running",
            DaemonState::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSnapshot {
    pub state: DaemonState,
    pub detail: String,
}

impl DaemonSnapshot {
    fn running(detail: impl Into<String>) -> Self {
        Self {
            state: DaemonState::Running,
            detail: detail.into(),
        }
    }
}

/// First line carrying the daemon's `=== Iteration` banner
static RE_ITERATION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^.*=== Iteration.*$").unwrap());

/// Derive daemon detail from its pane text
pub fn describe_daemon_output(content: &str) -> String {
    if let Some(line) = RE_ITERATION_LINE.find(content) {
        return line.as_str().trim().to_string();
    }
    if content.contains("Iteration") {
        return "Active".to_string();
    }
    "Monitoring".to_string()
}

/// Check liveness of the daemon session and summarize its latest activity
pub async fn check_daemon<H: Host + ?Sized>(
    host: &H,
    descriptor: &ProjectDescriptor,
) -> DaemonSnapshot {
    let session = descriptor.daemon_session();

    if !host.has_session(&session).await {
        return DaemonSnapshot {
            state: DaemonState::Stopped,
            detail: "Not running".to_string(),
        };
    }

    match host.capture_pane(&session, None).await {
        Ok(content) => DaemonSnapshot::running(describe_daemon_output(&content)),
        Err(e) => {
            debug!(session = %session, "daemon capture failed: {:#}", e);
            DaemonSnapshot::running("Monitoring")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_describe_iteration_banner() {
        let content = "checking workers\n  === Iteration 42 ===  \nsleeping\n=== Iteration 43 ===";
        assert_eq!(describe_daemon_output(content), "=== Iteration 42 ===");
    }

    #[test]
    fn test_describe_fallbacks() {
        assert_eq!(describe_daemon_output("Iteration complete"), "Active");
        assert_eq!(describe_daemon_output("watching..."), "Monitoring");
        assert_eq!(describe_daemon_output(""), "Monitoring");
    }

    #[tokio::test]
    async fn test_check_daemon() {
        let descriptor = ProjectDescriptor::new("Demo", "demo", "/srv/demo", &[]);

        let stopped = check_daemon(&FakeHost::new(), &descriptor).await;
        assert_eq!(stopped.state, DaemonState::Stopped);
        assert_eq!(stopped.detail, "Not running");

        let host = FakeHost::new()
            .session("demo-daemon", &[])
            .pane("demo-daemon", "=== Iteration 7 ===\n");
        assert_eq!(
            check_daemon(&host, &descriptor).await,
            DaemonSnapshot::running("=== Iteration 7 ===")
        );

        let host = FakeHost::new().session("demo-daemon", &[]);
        assert_eq!(
            check_daemon(&host, &descriptor).await,
            DaemonSnapshot::running("Monitoring")
        );
    }
}
