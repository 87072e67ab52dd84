//! Configuration module for linkshelf
//!
//! Configuration lives in `<config_dir>/linkshelf/config.toml` and can be
//! overridden per key from the environment with the `LINKSHELF__` prefix,
//! using `__` between nested keys (e.g. `LINKSHELF__CACHE__ENTRIES_TTL_SECS`).

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::keybinds::KeybindConfig;
use crate::search::SearchOptions;

/// Where catalog data comes from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded sled database
    #[default]
    Local,
    /// Hosted REST API
    Remote,
}

/// Connection settings for the hosted API
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: String,
    /// Public (anonymous) project key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Signed-in user's token; the API key is sent as bearer when absent
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "RemoteConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl RemoteConfig {
    const fn default_timeout() -> u64 {
        10
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            access_token: None,
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// Staleness windows for the query cache
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_entries_ttl")]
    pub entries_ttl_secs: u64,
    #[serde(default = "CacheConfig::default_categories_ttl")]
    pub categories_ttl_secs: u64,
    #[serde(default = "CacheConfig::default_capacity")]
    pub max_capacity: u64,
}

impl CacheConfig {
    const fn default_entries_ttl() -> u64 {
        2 * 60
    }
    const fn default_categories_ttl() -> u64 {
        10 * 60
    }
    const fn default_capacity() -> u64 {
        256
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entries_ttl_secs: Self::default_entries_ttl(),
            categories_ttl_secs: Self::default_categories_ttl(),
            max_capacity: Self::default_capacity(),
        }
    }
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ShelfConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// Location of the local database; platform data dir when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Identity used for saved links and click attribution
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub search: SearchOptions,

    #[serde(default)]
    pub keybinds: KeybindConfig,

    /// Suppress informational output by default
    #[serde(default)]
    pub quiet: bool,

    /// Log filter used when `RUST_LOG` is not set (e.g. "info", "linkshelf=debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

impl ShelfConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("linkshelf").join("config.toml"))
    }

    /// Load configuration, writing the defaults first if no file exists
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config file cannot be read, parsed, or created.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from `path` plus environment overrides
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or a value has the wrong type.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("LINKSHELF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Message(format!("Failed to create config directory: {e}")))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Database location, falling back to the platform data directory
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no path is configured and the data directory
    /// cannot be determined.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| ConfigError::Message("Could not determine data directory".to_string()))?;
        Ok(data_dir.join("linkshelf").join("db"))
    }
}
