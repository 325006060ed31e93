use crossterm::event::KeyEvent;

use crate::snapshot::Snapshot;

/// Actions that can be dispatched through the application
#[derive(Debug, Clone)]
pub enum Action {
    /// A key was pressed
    KeyPress(KeyEvent),
    /// A new snapshot was built by the poller
    SnapshotUpdated(Box<Snapshot>),
    /// Reading terminal input failed
    Error(String),
}
