//! Local note vault
//!
//! The sync service only ever creates folders, creates files and replaces
//! file contents. Nothing is deleted.

mod fs_store;
#[cfg(test)]
mod memory;

use thiserror::Error;

pub use fs_store::FsNoteStore;
#[cfg(test)]
pub(crate) use memory::MemoryNoteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid vault path: {0}")]
    InvalidPath(String),
    #[error("File already exists: {0}")]
    AlreadyExists(String),
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Vault operations, addressed by `/`-separated paths relative to the vault root
pub trait NoteStore: Send + Sync {
    fn exists(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<String, StoreError>;

    /// Write a new file; fails if it already exists
    fn create(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Replace an existing file's contents
    fn modify(&self, path: &str, content: &str) -> Result<(), StoreError>;

    /// Create a folder and any missing parents
    fn create_folder(&self, path: &str) -> Result<(), StoreError>;
}
