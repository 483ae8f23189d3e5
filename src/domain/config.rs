use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// File name the tool looks for when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Configuration for the account directory.
///
/// Holds the connection string of the document store the user collection
/// lives in. A `Config` can only be obtained through [`Config::load`] or
/// [`Config::new`], both of which guarantee a non-empty store URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Connection string of the document store.
    #[serde(rename = "mongo_url")]
    store_url: String,
}

impl Config {
    /// Creates a configuration pointing at the given store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if `store_url` is empty or
    /// whitespace.
    pub fn new(store_url: impl Into<String>) -> Result<Self, ConfigError> {
        let store_url = store_url.into();
        if store_url.trim().is_empty() {
            return Err(ConfigError::MissingField(STORE_URL_KEY));
        }
        Ok(Self { store_url })
    }

    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if nothing exists at `path`
    /// - [`ConfigError::Unreadable`] if the file exists but cannot be read
    /// - [`ConfigError::Malformed`] if the content is not valid TOML
    /// - [`ConfigError::MissingField`] if the store URL is absent or empty
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Unreadable(path.to_path_buf(), e),
        })?;

        let raw: RawConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Malformed(path.to_path_buf(), e))?;

        let config = Self::new(raw.into_store_url().unwrap_or_default())?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the store connection string.
    #[must_use]
    pub fn store_url(&self) -> &str {
        &self.store_url
    }
}

const STORE_URL_KEY: &str = "mongo_url";

/// The on-disk shape of the configuration file.
///
/// Every field is optional here so that a missing store URL is reported as
/// [`ConfigError::MissingField`] rather than as a parse failure. Deployments
/// may spell the key several ways, and may carry more than one of them.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    mongo_url: Option<String>,
    #[serde(default, rename = "storeURL")]
    store_url_camel: Option<String>,
    #[serde(default)]
    store_url: Option<String>,
}

impl RawConfig {
    /// Picks the first key that is set, in order of precedence.
    fn into_store_url(self) -> Option<String> {
        self.mongo_url
            .or(self.store_url_camel)
            .or(self.store_url)
    }
}

/// Errors that can occur while loading the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No file exists at the configured path.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {err}", path = .0.display(), err = .1)]
    Unreadable(PathBuf, #[source] io::Error),

    /// The file is not valid TOML.
    #[error("failed to parse config file {path}: {err}", path = .0.display(), err = .1)]
    Malformed(PathBuf, #[source] toml::de::Error),

    /// A required field is absent or empty.
    #[error("required field '{0}' is missing or empty")]
    MissingField(&'static str),
}
