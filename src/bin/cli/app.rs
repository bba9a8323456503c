use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use scribe_sync::config::CredentialStore;
use scribe_sync::{SyncService, SyncSettings, SyncStatus};

const STATUS_FILE: &str = "status.json";

/// Shared application state for CLI commands
pub struct App {
    pub config_path: PathBuf,
    pub settings: SyncSettings,
    pub credentials: CredentialStore,
}

impl App {
    /// Load settings from `config_path` or the default location
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path,
            None => SyncSettings::default_path().context("Failed to locate config directory")?,
        };

        let settings = SyncSettings::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        let credentials =
            CredentialStore::default_store().context("Failed to locate data directory")?;

        Ok(Self {
            config_path,
            settings,
            credentials,
        })
    }

    /// Build a sync service with the resolved session credential
    pub fn service(&self) -> Result<SyncService> {
        self.service_with(self.settings.clone())
    }

    pub fn service_with(&self, settings: SyncSettings) -> Result<SyncService> {
        let credential = self.credentials.resolve(&settings)?;
        SyncService::from_settings(settings, credential).context("Failed to set up sync service")
    }

    fn status_path(&self) -> PathBuf {
        self.credentials.data_dir().join(STATUS_FILE)
    }

    /// Status persisted by the last `sync` or `watch` run
    pub fn load_status(&self) -> Result<Option<SyncStatus>> {
        let path = self.status_path();
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let status = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(status))
    }

    pub fn save_status(&self, status: &SyncStatus) -> Result<()> {
        let path = self.status_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(status)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
