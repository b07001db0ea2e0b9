//! Process-wide configuration.
//!
//! # Layout
//!
//! ```text
//! ~/.statusbridge/
//!   config.yaml   (optional: every key has a default)
//! ```
//!
//! Secrets never live in the YAML file; they arrive through the environment
//! (or CLI flags) as [`ShotGridCredentials`] and [`FileMakerCredentials`].
//!
//! # API pattern
//!
//! - `load_at(path)`: explicit path; used in tests with `TempDir`
//! - `load()`: derives the path from `dirs::home_dir()`, delegates to `load_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::status_map::StatusMap;

pub const DEFAULT_BIND: &str = "0.0.0.0:5001";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// 1. Settings
// ---------------------------------------------------------------------------

/// Where the Resolver takes a Shot's status from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotStatusSource {
    /// Look every Shot up again; the batch query's denormalized field may be stale.
    #[default]
    Refetch,
    /// Trust `entity.Shot.sg_status_list` from the Version batch query.
    Batch,
}

/// How a translated status is written into the external store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum UpdateMode {
    /// Find the record by key field, then patch the status field.
    #[default]
    Record,
    /// Run a server-side script with `{"sg_id", "status"}` as its parameter.
    Script { script_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMakerSettings {
    pub layout: String,
    pub key_field: String,
    pub status_field: String,
    pub update_mode: UpdateMode,
}

impl Default for FileMakerSettings {
    fn default() -> Self {
        Self {
            layout: "status_update".to_string(),
            key_field: "SG_ID".to_string(),
            status_field: "Status".to_string(),
            update_mode: UpdateMode::Record,
        }
    }
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind: String,
    pub timeout_secs: u64,
    pub shot_status_source: ShotStatusSource,
    pub filemaker: FileMakerSettings,
    pub status_map: StatusMap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            shot_status_source: ShotStatusSource::default(),
            filemaker: FileMakerSettings::default(),
            status_map: StatusMap::default(),
        }
    }
}

impl Settings {
    /// Per-request timeout for both outbound HTTP dependencies. Never zero.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

// ---------------------------------------------------------------------------
// 2. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.statusbridge/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".statusbridge").join("config.yaml")
}

/// `config_path_at` convenience wrapper.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load settings from `path`. A missing file yields [`Settings::default`];
/// malformed YAML yields `ConfigError::Parse` with the path attached.
pub fn load_at(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `load_at` convenience wrapper for the default location.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&config_path()?)
}

// ---------------------------------------------------------------------------
// 4. Credentials
// ---------------------------------------------------------------------------

/// Script-key credentials for the tracking system.
#[derive(Clone, PartialEq, Eq)]
pub struct ShotGridCredentials {
    pub site_url: String,
    pub script_name: String,
    pub api_key: String,
}

impl ShotGridCredentials {
    pub fn new(
        site_url: impl Into<String>,
        script_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let creds = Self {
            site_url: site_url.into(),
            script_name: script_name.into(),
            api_key: api_key.into(),
        };
        require("SG_URL", &creds.site_url)?;
        require("SG_SCRIPT_NAME", &creds.script_name)?;
        require("SG_API_KEY", &creds.api_key)?;
        Ok(creds)
    }
}

impl fmt::Debug for ShotGridCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShotGridCredentials")
            .field("site_url", &self.site_url)
            .field("script_name", &self.script_name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Account credentials for the external store.
#[derive(Clone, PartialEq, Eq)]
pub struct FileMakerCredentials {
    pub server: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl FileMakerCredentials {
    pub fn new(
        server: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let creds = Self {
            server: server.into(),
            database: database.into(),
            username: username.into(),
            password: password.into(),
        };
        require("FMP_SERVER", &creds.server)?;
        require("FMP_DB", &creds.database)?;
        require("FMP_USERNAME", &creds.username)?;
        require("FMP_PASSWORD", &creds.password)?;
        Ok(creds)
    }
}

impl fmt::Debug for FileMakerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMakerCredentials")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn require(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
