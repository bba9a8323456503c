use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{NoteStore, StoreError};

/// Note store backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsNoteStore {
    root: PathBuf,
}

impl FsNoteStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a vault-relative path, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StoreError::InvalidPath(path.to_string())),
            }
        }

        if resolved == self.root {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(resolved)
    }
}

impl NoteStore for FsNoteStore {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn read(&self, path: &str) -> Result<String, StoreError> {
        let full = self.resolve(path)?;
        fs::read_to_string(&full).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
            _ => StoreError::Io(e),
        })
    }

    fn create(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        if full.exists() {
            return Err(StoreError::AlreadyExists(path.to_string()));
        }
        write_atomic(&full, content.as_bytes())?;
        log::debug!("Vault: created {}", path);
        Ok(())
    }

    fn modify(&self, path: &str, content: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        if !full.is_file() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        write_atomic(&full, content.as_bytes())?;
        log::debug!("Vault: modified {}", path);
        Ok(())
    }

    fn create_folder(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full)?;
        Ok(())
    }
}

fn fsync_dir(path: &Path) -> io::Result<()> {
    let dir = File::open(path)?;
    dir.sync_all()
}

fn temp_path_for(dest: &Path) -> io::Result<PathBuf> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    Ok(dest.with_file_name(format!(
        ".{}.tmp.{}.{}",
        file_name.to_string_lossy(),
        std::process::id(),
        nanos
    )))
}

/// Write to a sibling temp file, then rename over the destination
fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = temp_path_for(dest)?;
    let written = (|| {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&tmp, dest)
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    // Directory fsync is unsupported on some platforms
    if let Err(e) = fsync_dir(parent) {
        log::debug!("Vault: directory sync skipped for {}: {}", parent.display(), e);
    }
    Ok(())
}
