use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};

mod actions;
mod app;
mod config;
mod daemon;
mod git;
mod host;
mod snapshot;
mod tmux;

use actions::Action;
use app::App;
use config::ProjectDescriptor;
use host::SystemHost;

/// Live status monitor for Czarina workers, daemon and worktrees
#[derive(Debug, Parser)]
#[command(name = "czarina-dashboard", version)]
struct Args {
    /// Path to the `.czarina` directory (searched upward from cwd by default)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Seconds between refreshes
    #[arg(long, default_value_t = 3)]
    interval: u64,

    /// Upper bound in seconds on each tmux/git command
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Print a single snapshot as JSON and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}

fn load_descriptor(args: &Args) -> Result<ProjectDescriptor> {
    let project_dir = match &args.dir {
        Some(dir) => dir.clone(),
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            config::find_project_dir(&cwd).with_context(|| {
                format!(
                    "No {} directory found; run this from a Czarina project directory",
                    config::PROJECT_DIR_NAME
                )
            })?
        }
    };

    Ok(ProjectDescriptor::load(&project_dir)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging on stderr, quiet by default so the TUI stays intact
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let descriptor = Arc::new(load_descriptor(&args)?);
    let command_timeout = args.command_timeout();

    if args.once {
        let host = SystemHost::new(command_timeout);
        let snapshot = snapshot::tick(&descriptor, &host, Local::now()).await;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();
    let refresh = Arc::new(Notify::new());

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        let _ = input_tx.send(Action::KeyPress(key));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = input_tx.send(Action::Error(format!("Input: {}", e)));
                    }
                }
            }
        }
    });

    // Spawn snapshot poller, one full tick at a time
    let poll_tx = tx.clone();
    let poll_refresh = refresh.clone();
    let poll_descriptor = descriptor.clone();
    let interval = args.refresh_interval();
    tokio::spawn(async move {
        let host = SystemHost::new(command_timeout);
        loop {
            let snapshot = snapshot::tick(&poll_descriptor, &host, Local::now()).await;
            tracing::debug!(workers = snapshot.workers.len(), "tick complete");
            if poll_tx
                .send(Action::SnapshotUpdated(Box::new(snapshot)))
                .is_err()
            {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = poll_refresh.notified() => {}
            }
        }
    });

    let mut app = App::new(descriptor.as_ref().clone());

    // Main event loop
    let result = loop {
        // Render
        if let Err(e) = terminal.draw(|f| app.render(f)) {
            break Err(e.into());
        }

        if app.take_refresh_request() {
            refresh.notify_one();
        }

        // Handle events from channel
        tokio::select! {
            Some(action) = rx.recv() => {
                match app.handle_action(action) {
                    Ok(should_quit) => {
                        if should_quit {
                            break Ok(());
                        }
                    }
                    Err(e) => {
                        break Err(e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break Ok(());
            }
        }
    };

    // Restore terminal
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_durations_are_clamped() {
        let args = Args::parse_from(["czarina-dashboard", "--timeout", "0", "--interval", "0"]);
        assert_eq!(args.command_timeout(), Duration::from_secs(1));
        assert_eq!(args.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_default_durations() {
        let args = Args::parse_from(["czarina-dashboard"]);
        assert_eq!(args.command_timeout(), Duration::from_secs(5));
        assert_eq!(args.refresh_interval(), Duration::from_secs(3));
        assert!(!args.once);
    }
}
