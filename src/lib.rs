//! Pulls handwritten notebooks from the Kindle Scribe web service and keeps
//! one Markdown file per notebook in a local vault.

pub mod archive;
pub mod config;
pub mod notebook;
pub mod processing;
pub mod remote;
pub mod render;
pub mod sync;
pub mod vault;

pub use config::{CredentialStore, SyncSettings};
pub use sync::{SyncError, SyncReport, SyncService, SyncStatus};
