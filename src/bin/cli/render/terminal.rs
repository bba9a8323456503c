use scribe_sync::sync::{NotebookOutcome, SyncReport, SyncState};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

pub fn outcome_label(outcome: &NotebookOutcome, use_color: bool) -> String {
    match outcome {
        NotebookOutcome::Created => paint("created", Color::GREEN, use_color),
        NotebookOutcome::Updated => paint("updated", Color::CYAN, use_color),
        NotebookOutcome::Unchanged => paint("unchanged", Color::DIM, use_color),
        NotebookOutcome::Failed(message) => {
            paint(&format!("failed: {}", message), Color::RED, use_color)
        }
    }
}

pub fn state_label(state: SyncState, use_color: bool) -> String {
    match state {
        SyncState::Idle => paint("idle", Color::DIM, use_color),
        SyncState::Syncing => paint("syncing", Color::YELLOW, use_color),
        SyncState::Success => paint("success", Color::GREEN, use_color),
        SyncState::Error => paint("error", Color::RED, use_color),
    }
}

/// One line per notebook, then a summary line
pub fn report_lines(report: &SyncReport, use_color: bool) -> Vec<String> {
    let mut lines: Vec<String> = report
        .results
        .iter()
        .map(|r| format!("  {} -> {} ({})", r.name, r.path, outcome_label(&r.outcome, use_color)))
        .collect();

    lines.push(format!(
        "{} of {} notebook(s) synced in {}ms: {} created, {} updated, {} unchanged, {} failed",
        report.eligible,
        report.listed,
        report.duration_ms(),
        report.created(),
        report.updated(),
        report.unchanged(),
        report.failed()
    ));
    lines
}
