use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "artifactorial";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const BLOBS_DIR_NAME: &str = "artifacts";

/// Contents of `config.toml`. Every field has a default, so an empty or
/// missing file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// SQLite URL of the catalog database (defaults to a file in the app directory)
    #[serde(default)]
    pub database_url: Option<String>,
    /// Directory holding the artifact bytes (defaults to `artifacts/` in the app directory)
    #[serde(default)]
    pub blob_root: Option<PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Directory for log files (stdout only if not set)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Seconds between directory index refreshes, 0 to disable
    #[serde(default = "default_catalog_refresh_secs")]
    pub catalog_refresh_secs: u64,
    /// Read size when streaming and digesting blobs
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_refresh_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    common::blobs::DEFAULT_CHUNK_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            database_url: None,
            blob_root: None,
            log_level: default_log_level(),
            log_dir: None,
            catalog_refresh_secs: default_catalog_refresh_secs(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    /// The app directory (`~/.artifactorial`).
    pub fn app_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::app_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load the configuration file.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(custom_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match custom_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::MissingFile(path.to_path_buf()));
                }
                path.to_path_buf()
            }
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        Self::from_toml(&fs::read_to_string(&path)?)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.log_level()?;
        Ok(config)
    }

    pub fn log_level(&self) -> Result<tracing::Level, ConfigError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn database_url(&self) -> Result<Url, ConfigError> {
        match &self.database_url {
            Some(raw) => Ok(Url::parse(raw)?),
            None => {
                let path = Self::app_dir()?.join(DB_FILE_NAME);
                Ok(Url::parse(&format!("sqlite://{}", path.display()))?)
            }
        }
    }

    pub fn blob_root(&self) -> Result<PathBuf, ConfigError> {
        match &self.blob_root {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::app_dir()?.join(BLOBS_DIR_NAME)),
        }
    }

    pub fn catalog_refresh_interval(&self) -> Option<Duration> {
        (self.catalog_refresh_secs > 0).then(|| Duration::from_secs(self.catalog_refresh_secs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no home directory found")]
    NoHomeDirectory,
    #[error("config file not found: {0}")]
    MissingFile(PathBuf),
    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),
    #[error("invalid database url: {0}")]
    Url(#[from] url::ParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
