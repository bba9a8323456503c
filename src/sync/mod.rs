//! Sync orchestration: one pass pulls every selected notebook, renders it
//! and reconciles the result with the vault.

mod paths;
pub mod scheduler;
mod service;
mod status;
#[cfg(test)]
mod testing;

pub use paths::{normalize_folder, sanitize_file_name, NotePathPlanner};
pub use scheduler::{SyncScheduler, SyncSchedulerMessage};
pub use service::{ConnectionReport, SyncError, SyncService, SyncServiceBuilder};
pub use status::{NotebookOutcome, NotebookResult, SyncPhase, SyncReport, SyncState, SyncStatus};
