use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall sync state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// No pass has run yet
    #[default]
    Idle,
    /// A pass is in flight
    Syncing,
    /// Last pass completed
    Success,
    /// Last pass aborted
    Error,
}

/// Step of the pass currently running
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SyncPhase {
    #[default]
    Idle,
    Validating,
    Listing,
    Fetching,
    Decoding,
    Rendering,
    Reconciling,
}

/// What happened to one notebook during a pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "message", rename_all = "camelCase")]
pub enum NotebookOutcome {
    Created,
    Updated,
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotebookResult {
    pub notebook_id: String,
    pub name: String,
    /// Vault path of the notebook file
    pub path: String,
    pub outcome: NotebookOutcome,
}

/// Result of one completed pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Notebooks in the remote listing
    pub listed: usize,
    /// Notebooks passing the selection filter
    pub eligible: usize,
    pub results: Vec<NotebookResult>,
}

impl SyncReport {
    fn count(&self, pred: impl Fn(&NotebookOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| *o == NotebookOutcome::Created)
    }

    pub fn updated(&self) -> usize {
        self.count(|o| *o == NotebookOutcome::Updated)
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| *o == NotebookOutcome::Unchanged)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, NotebookOutcome::Failed(_)))
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Snapshot of the sync service's state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    pub phase: SyncPhase,
    /// Notebook being processed, while syncing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_notebook: Option<String>,
    /// End of the last completed pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    /// Why the last pass aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<SyncReport>,
}
