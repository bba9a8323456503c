//! Configuration
//!
//! Settings are loaded once into an immutable [`SyncSettings`] snapshot and
//! handed to each component at construction. Changes are persisted with an
//! explicit [`SyncSettings::save`].

mod credentials;
mod settings;

pub use credentials::{CredentialStore, SESSION_ENV_VAR};
pub use settings::{ConfigError, ImageQuality, LogLevel, RemoteConfig, SyncSettings};
