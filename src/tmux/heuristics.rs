use serde::{Deserialize, Serialize};

/// Semantic state of a worker, re-derived from its pane on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Worker is doing something
    Active,
    /// Pane shows an error or failure, or could not be captured
    Error,
    /// Worker is blocked on a question or confirmation
    WaitingForInput,
    /// Agent banner is up but no task has started
    ReadyNotStarted,
    /// Sitting at a shell prompt
    Idle,
    /// No snapshot has been taken yet
    Unknown,
    /// No window for this worker in any live session
    NotFound,
}

impl WorkerState {
    pub fn label(self) -> &'static str {
        match self {
            WorkerState::Active => "Active",
            WorkerState::Error => "Error",
            WorkerState::WaitingForInput => "Waiting",
            WorkerState::ReadyNotStarted => "Ready",
            WorkerState::Idle => "Idle",
            WorkerState::Unknown => "Unknown",
            WorkerState::NotFound => "Not Found",
        }
    }
}

/// One classification rule. Rules are tried in declaration order and the
/// first match wins; overlapping keywords are resolved only by that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    AssistantEditing,
    ErrorBanner,
    NeedsInput,
    ReadyBanner,
    ShellPrompt,
}

const RULES: [Rule; 5] = [
    Rule::AssistantEditing,
    Rule::ErrorBanner,
    Rule::NeedsInput,
    Rule::ReadyBanner,
    Rule::ShellPrompt,
];

impl Rule {
    /// `lower` is the lowercased pane text, `raw` the original
    fn matches(self, lower: &str, raw: &str) -> bool {
        match self {
            Rule::AssistantEditing => {
                lower.contains("aider") && (lower.contains("add") || lower.contains("edit"))
            }
            Rule::ErrorBanner => lower.contains("error") || lower.contains("failed"),
            Rule::NeedsInput => lower.contains("waiting") || lower.contains("do you want"),
            Rule::ReadyBanner => lower.contains("ready for claude code"),
            Rule::ShellPrompt => raw.trim().ends_with('$'),
        }
    }

    fn outcome(self) -> (WorkerState, &'static str) {
        match self {
            Rule::AssistantEditing => (WorkerState::Active, "Working with Aider"),
            Rule::ErrorBanner => (WorkerState::Error, "Error detected"),
            Rule::NeedsInput => (WorkerState::WaitingForInput, "Needs input"),
            Rule::ReadyBanner => (WorkerState::ReadyNotStarted, "Waiting to start"),
            Rule::ShellPrompt => (WorkerState::Idle, "At prompt"),
        }
    }
}

/// Engine for inferring worker state from pane content
pub struct StateInferenceEngine;

impl StateInferenceEngine {
    /// Classify pane text into a state and a short detail string.
    ///
    /// Unrecognized output is assumed to mean the worker is running.
    pub fn analyze(content: &str) -> (WorkerState, &'static str) {
        let lower = content.to_lowercase();

        RULES
            .iter()
            .find(|rule| rule.matches(&lower, content))
            .map(|rule| rule.outcome())
            .unwrap_or((WorkerState::Active, "Running"))
    }
}
