use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::actions::Action;
use crate::config::ProjectDescriptor;
use crate::daemon::DaemonState;
use crate::git::GitStatus;
use crate::snapshot::Snapshot;
use crate::tmux::WorkerState;

/// Theme colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(0, 175, 215),
            dim: Color::Rgb(100, 100, 100),
            success: Color::Rgb(80, 200, 120),
            warning: Color::Rgb(255, 193, 7),
            error: Color::Rgb(220, 53, 69),
        }
    }
}

/// Dashboard state: the latest snapshot plus presentation concerns
pub struct App {
    pub descriptor: ProjectDescriptor,
    /// Most recent snapshot, `None` until the first tick lands
    pub snapshot: Option<Snapshot>,
    /// Current message to display (input errors)
    pub error_message: Option<String>,
    pub theme: Theme,
    /// Set when the user asks for an immediate refresh
    pub refresh_requested: bool,
}

impl App {
    pub fn new(descriptor: ProjectDescriptor) -> Self {
        Self {
            descriptor,
            snapshot: None,
            error_message: None,
            theme: Theme::default(),
            refresh_requested: false,
        }
    }

    /// Take the pending refresh request, if any
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            Action::SnapshotUpdated(snapshot) => {
                self.snapshot = Some(*snapshot);
                self.error_message = None;
                Ok(false)
            }
            Action::Error(msg) => {
                self.error_message = Some(msg);
                Ok(false)
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char('r') => self.refresh_requested = true,
            _ => {}
        }
        Ok(false)
    }

    fn state_style(&self, state: WorkerState) -> Style {
        let color = match state {
            WorkerState::Active => self.theme.success,
            WorkerState::Error => self.theme.error,
            WorkerState::WaitingForInput => self.theme.warning,
            WorkerState::ReadyNotStarted | WorkerState::Idle => self.theme.fg,
            WorkerState::Unknown | WorkerState::NotFound => self.theme.dim,
        };
        Style::default().fg(color)
    }

    fn git_style(&self, status: GitStatus) -> Style {
        let color = match status {
            GitStatus::Clean => self.theme.success,
            GitStatus::Changed { .. } => self.theme.warning,
            GitStatus::NoWorktree | GitStatus::GitError => self.theme.error,
        };
        Style::default().fg(color)
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Header
                Constraint::Min(0),    // Main content
                Constraint::Length(3), // Footer/status
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_main(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let timestamp = self
            .snapshot
            .as_ref()
            .map(|s| s.timestamp.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "Loading...".to_string());

        let title = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    " Czarina Dashboard ",
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("│ {}", self.descriptor.name),
                    Style::default().fg(self.theme.fg),
                ),
            ]),
            Line::from(Span::styled(
                format!(" {}", self.descriptor.repository_root.display()),
                Style::default().fg(self.theme.dim),
            )),
            Line::from(Span::styled(
                format!(" {}", timestamp),
                Style::default().fg(self.theme.dim),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.accent)),
        );
        frame.render_widget(title, area);
    }

    fn render_main(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(65), // Workers table
                Constraint::Percentage(35), // Status panel
            ])
            .split(area);

        self.render_workers(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
    }

    fn render_workers(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec!["Worker", "Status", "Git", "Details"]).style(
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = match &self.snapshot {
            Some(snapshot) => snapshot
                .workers
                .iter()
                .map(|worker| {
                    Row::new(vec![
                        Cell::from(worker.id.as_str()).style(Style::default().fg(self.theme.fg)),
                        Cell::from(worker.state.label()).style(self.state_style(worker.state)),
                        Cell::from(worker.git_status.to_string())
                            .style(self.git_style(worker.git_status)),
                        Cell::from(worker.detail.as_str())
                            .style(Style::default().fg(self.theme.dim)),
                    ])
                })
                .collect(),
            None => self
                .descriptor
                .workers
                .iter()
                .map(|worker| {
                    Row::new(vec![
                        Cell::from(worker.id.as_str()),
                        Cell::from(WorkerState::Unknown.label())
                            .style(self.state_style(WorkerState::Unknown)),
                        Cell::from("..."),
                        Cell::from(""),
                    ])
                    .style(Style::default().fg(self.theme.dim))
                })
                .collect(),
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(25),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .title(" Workers ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(table, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let label =
            |text: String| Line::from(Span::styled(text, Style::default().fg(self.theme.fg)));

        let content = match &self.snapshot {
            Some(snapshot) => {
                let daemon_color = match snapshot.daemon.state {
                    DaemonState::Running => self.theme.success,
                    DaemonState::Stopped => self.theme.error,
                };

                let mut lines = vec![
                    label(format!("Sessions: {}", snapshot.live_sessions.len())),
                    label(format!("Workers: {}", snapshot.workers.len())),
                    Line::from(Span::styled(
                        format!("  Active: {}", snapshot.count(WorkerState::Active)),
                        Style::default().fg(self.theme.success),
                    )),
                    Line::from(Span::styled(
                        format!("  Idle: {}", snapshot.count(WorkerState::Idle)),
                        Style::default().fg(self.theme.dim),
                    )),
                    Line::from(""),
                    Line::from(Span::styled(
                        format!("Daemon: {}", snapshot.daemon.state.label()),
                        Style::default()
                            .fg(daemon_color)
                            .add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("  {}", snapshot.daemon.detail),
                        Style::default().fg(self.theme.dim),
                    )),
                ];

                if let Some(count) = snapshot.worktree_count {
                    lines.push(Line::from(""));
                    lines.push(label(format!("Worktrees: {}", count)));
                }
                lines
            }
            None => vec![Line::from(Span::styled(
                "Waiting for first refresh...",
                Style::default().fg(self.theme.dim),
            ))],
        };

        let status = Paragraph::new(content).block(
            Block::default()
                .title(" Status ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.warning)),
        );
        frame.render_widget(status, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let content = if let Some(ref msg) = self.error_message {
            Line::from(Span::styled(
                format!(" {} ", msg),
                Style::default().fg(self.theme.error),
            ))
        } else {
            let sessions = self
                .snapshot
                .as_ref()
                .map(|s| s.live_sessions.join(", "))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(" q: Quit │ r: Refresh ", Style::default().fg(self.theme.dim)),
                Span::styled(
                    format!("│ Sessions: {}", sessions),
                    Style::default().fg(self.theme.dim),
                ),
            ])
        };

        let footer = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::DaemonSnapshot;
    use crate::snapshot::WorkerSnapshot;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Action {
        Action::KeyPress(KeyEvent::new(code, modifiers))
    }

    fn app() -> App {
        App::new(ProjectDescriptor::new("Demo", "demo", "/srv/demo", &["backend"]))
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            timestamp: chrono::Local::now(),
            workers: vec![WorkerSnapshot {
                id: "backend".to_string(),
                state: WorkerState::Idle,
                detail: "At prompt".to_string(),
                git_status: GitStatus::Clean,
            }],
            daemon: DaemonSnapshot {
                state: DaemonState::Stopped,
                detail: "Not running".to_string(),
            },
            live_sessions: vec!["demo-main".to_string()],
            worktree_count: Some(1),
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!app.handle_action(key(KeyCode::Char('x'), KeyModifiers::NONE)).unwrap());
        assert!(app.handle_action(key(KeyCode::Char('q'), KeyModifiers::NONE)).unwrap());
        assert!(app.handle_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap());
    }

    #[test]
    fn test_refresh_request_is_taken_once() {
        let mut app = app();
        app.handle_action(key(KeyCode::Char('r'), KeyModifiers::NONE)).unwrap();
        assert!(app.take_refresh_request());
        assert!(!app.take_refresh_request());
    }

    #[test]
    fn test_snapshot_clears_error() {
        let mut app = app();
        app.handle_action(Action::Error("boom".to_string())).unwrap();
        assert_eq!(app.error_message.as_deref(), Some("boom"));
        app.handle_action(Action::SnapshotUpdated(Box::new(snapshot())))
            .unwrap();
        assert!(app.error_message.is_none());
        assert_eq!(app.snapshot.as_ref().map(|s| s.workers.len()), Some(1));
    }

    #[test]
    fn test_render_before_first_snapshot() {
        let app = app();

        let mut terminal = Terminal::new(TestBackend::new(120, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("backend"));
        assert!(text.contains("Unknown"));
        assert!(text.contains("Waiting for first refresh"));
    }

    #[test]
    fn test_render_snapshot() {
        let mut app = app();
        app.snapshot = Some(snapshot());

        let mut terminal = Terminal::new(TestBackend::new(120, 24)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("backend"));
        assert!(text.contains("At prompt"));
        assert!(text.contains("Not running"));
        assert!(text.contains("demo-main"));
    }
}
