use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR_NAME: &str = "scribe-sync";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default sync interval in seconds (one hour)
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 3600;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Config directory not found")]
    ConfigDirNotFound,
}

/// Resolution requested from the render endpoint, and the re-encoding
/// quality used when page transcoding is enabled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    High,
    Medium,
    Low,
}

impl ImageQuality {
    /// DPI passed to the render endpoint
    pub fn dpi(self) -> u32 {
        match self {
            ImageQuality::High => 160,
            ImageQuality::Medium => 120,
            ImageQuality::Low => 80,
        }
    }

    /// JPEG quality (1-100) used by the transcoder
    pub fn jpeg_quality(self) -> u8 {
        match self {
            ImageQuality::High => 90,
            ImageQuality::Medium => 80,
            ImageQuality::Low => 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Endpoint and client-identification settings for the notebook service.
///
/// The service's undocumented API answers differently depending on the
/// client signature, so these mirror the mobile web reader by default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub marketplace_id: String,
    pub user_agent: String,
    pub origin: String,
    pub referer: String,
    /// Page width requested from the render endpoint
    pub page_width: u32,
    /// Page height requested from the render endpoint
    pub page_height: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://read.amazon.com".to_string(),
            marketplace_id: "ATVPDKIKX0DER".to_string(),
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1".to_string(),
            origin: "https://read.amazon.com".to_string(),
            referer: "https://read.amazon.com/kindle-notebook?ref_=neo_mm_yn_na_kfa".to_string(),
            page_width: 388,
            page_height: 663,
        }
    }
}

/// Sync settings snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Cookie header value of a signed-in web session. Leave empty to use
    /// the credential store or the environment instead.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_credential: String,
    /// Root directory of the local note vault
    pub vault_root: PathBuf,
    /// Folder inside the vault receiving notebook files
    pub target_folder: String,
    pub sync_interval_seconds: u64,
    /// Notebook ids to sync; empty means all notebooks
    pub selected_notebook_ids: BTreeSet<String>,
    pub auto_sync_enabled: bool,
    pub sync_on_startup: bool,
    pub image_quality: ImageQuality,
    /// Tidy recognized handwriting into Markdown (links, tables)
    pub enable_markdown_conversion: bool,
    /// Reserved; local edits are never pushed back
    pub enable_bidirectional_sync: bool,
    /// Run handwriting recognition on each page
    pub convert_handwriting: bool,
    /// Re-encode page images before embedding them
    pub transcode_images: bool,
    /// Place notebook files in sub-folders mirroring the remote folders
    pub mirror_remote_folders: bool,
    pub log_level: LogLevel,
    /// OCR program invoked for handwriting recognition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_command: Option<String>,
    pub remote: RemoteConfig,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            session_credential: String::new(),
            vault_root: PathBuf::from("."),
            target_folder: "Kindle Notes".to_string(),
            sync_interval_seconds: DEFAULT_SYNC_INTERVAL_SECS,
            selected_notebook_ids: BTreeSet::new(),
            auto_sync_enabled: true,
            sync_on_startup: true,
            image_quality: ImageQuality::High,
            enable_markdown_conversion: true,
            enable_bidirectional_sync: false,
            convert_handwriting: false,
            transcode_images: false,
            mirror_remote_folders: false,
            log_level: LogLevel::Info,
            ocr_command: None,
            remote: RemoteConfig::default(),
        }
    }
}

impl SyncSettings {
    /// Default config file location (`<config dir>/scribe-sync/config.toml`)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Load settings from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        let settings: SyncSettings = toml::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Persist settings to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw)?;

        // Restrict permissions on Unix when a credential is stored inline
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if !self.session_credential.is_empty() {
                let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
            }
        }

        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "syncIntervalSeconds must be greater than 0".to_string(),
            ));
        }
        if !self.remote.base_url.starts_with("http://") && !self.remote.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "remote.baseUrl must start with http:// or https://".to_string(),
            ));
        }
        if self.remote.page_width == 0 || self.remote.page_height == 0 {
            return Err(ConfigError::Invalid(
                "remote.pageWidth and remote.pageHeight must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a notebook passes the selection filter
    pub fn is_selected(&self, notebook_id: &str) -> bool {
        self.selected_notebook_ids.is_empty() || self.selected_notebook_ids.contains(notebook_id)
    }

    /// Absolute-ish directory receiving notebook files
    pub fn target_dir(&self) -> PathBuf {
        self.vault_root.join(&self.target_folder)
    }
}
