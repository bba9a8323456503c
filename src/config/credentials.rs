use std::fs;
use std::path::{Path, PathBuf};

use super::settings::{ConfigError, SyncSettings};

/// Environment variable that overrides every stored session credential
pub const SESSION_ENV_VAR: &str = "SCRIBE_SYNC_SESSION";

const KEYRING_SERVICE: &str = "scribe-sync";
const KEYRING_ACCOUNT: &str = "session";

/// Session credential storage: a private file first, the OS keyring as
/// fallback.
pub struct CredentialStore {
    data_dir: PathBuf,
}

impl CredentialStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Store rooted at the platform's local data directory
    pub fn default_store() -> Result<Self, ConfigError> {
        dirs::data_local_dir()
            .map(|p| Self::new(p.join(KEYRING_SERVICE)))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Directory holding the credential file and other local state
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn file_path(&self) -> PathBuf {
        self.data_dir.join(".credentials").join(KEYRING_ACCOUNT)
    }

    /// Get the stored credential: try file first, then keyring
    pub fn get(&self) -> Option<String> {
        if let Ok(data) = fs::read_to_string(self.file_path()) {
            let data = data.trim();
            if !data.is_empty() {
                return Some(data.to_string());
            }
        }

        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT).ok()?;
        match entry.get_password() {
            Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                log::debug!("No session credential in keyring: {}", e);
                None
            }
        }
    }

    /// Store credential: write to file, also try keyring
    pub fn set(&self, credential: &str) -> Result<(), ConfigError> {
        let file_path = self.file_path();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, credential.trim())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&file_path, fs::Permissions::from_mode(0o600));
        }

        // Best-effort
        match keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT) {
            Ok(entry) => {
                if let Err(e) = entry.set_password(credential.trim()) {
                    log::debug!("Keyring unavailable, credential kept in file only: {}", e);
                }
            }
            Err(e) => log::debug!("Keyring unavailable: {}", e),
        }

        Ok(())
    }

    /// Delete the credential from both stores
    pub fn clear(&self) -> Result<(), ConfigError> {
        let _ = fs::remove_file(self.file_path());

        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ACCOUNT) {
            let _ = entry.delete_credential();
        }
        Ok(())
    }

    /// Resolve the credential to use for a session.
    ///
    /// Order: `SCRIBE_SYNC_SESSION`, the config file's `sessionCredential`,
    /// then this store.
    pub fn resolve(&self, settings: &SyncSettings) -> Result<String, ConfigError> {
        if let Ok(value) = std::env::var(SESSION_ENV_VAR) {
            if !value.trim().is_empty() {
                return Ok(value.trim().to_string());
            }
        }

        if !settings.session_credential.trim().is_empty() {
            return Ok(settings.session_credential.trim().to_string());
        }

        self.get().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "no session credential configured; run `scribe-sync config set-credential` or set {}",
                SESSION_ENV_VAR
            ))
        })
    }
}
