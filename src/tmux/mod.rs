mod client;
mod heuristics;
mod pane;

pub use client::TmuxClient;
pub use heuristics::{StateInferenceEngine, WorkerState};
pub use pane::{discover_sessions, is_daemon_session, read_worker_pane, PaneError};
