use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{NoteStore, StoreError};

/// In-memory store recording every write
#[derive(Default)]
pub(crate) struct MemoryNoteStore {
    files: Mutex<BTreeMap<String, String>>,
    folders: Mutex<BTreeSet<String>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> BTreeMap<String, String> {
        self.files.lock().unwrap().clone()
    }

    pub fn folders(&self) -> BTreeSet<String> {
        self.folders.lock().unwrap().clone()
    }

    /// Paths passed to `create` or `modify`, in call order
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub fn put(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }
}

impl NoteStore for MemoryNoteStore {
    fn exists(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.folders.lock().unwrap().contains(path)
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn create(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        files.insert(path.to_string(), content.to_string());
        self.writes.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn modify(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(path) {
            Some(existing) => *existing = content.to_string(),
            None => return Err(StoreError::NotFound(path.to_string())),
        }
        self.writes.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        self.folders.lock().unwrap().insert(path.to_string());
        Ok(())
    }
}
