use miette::Diagnostic;
use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

/// Environment variable overriding [`SyncConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "CODESYNC_ENDPOINT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// The authority URL the transport connects to.
    pub endpoint: String,
    /// Bound of the session reactor's input and output channels.
    pub channel_capacity: usize,
    /// Tracing filter directive (e.g. `codesync=debug`). `RUST_LOG` wins if set.
    pub log_filter: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:4000/sync".to_owned(),
            channel_capacity: 64,
            log_filter: None,
        }
    }
}

/// Errors from loading or saving configuration.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to access config file {}", path.display())]
    #[diagnostic(code(codesync::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format: {} (expected .json or .toml)", .0.display())]
    #[diagnostic(
        code(codesync::config::format),
        help("rename the file with a .json or .toml extension")
    )]
    UnsupportedFormat(PathBuf),

    #[error("invalid JSON config")]
    #[diagnostic(code(codesync::config::json))]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML config")]
    #[diagnostic(code(codesync::config::toml))]
    TomlDe(#[from] toml::de::Error),

    #[error("failed to serialize TOML config")]
    #[diagnostic(code(codesync::config::toml))]
    TomlSer(#[from] toml::ser::Error),
}

impl SyncConfig {
    /// Loads the configuration from the provided loader.
    pub async fn load(loader: &impl Loader) -> Result<Self, ConfigError> {
        loader.load().await
    }

    /// Saves the configuration using the provided saver.
    pub async fn save(&self, saver: &impl Saver) -> Result<(), ConfigError> {
        saver.save(self).await
    }

    /// Load from `store`, falling back to defaults when the file is absent.
    ///
    /// Environment overrides are applied either way.
    pub async fn load_or_default(store: &FileStore) -> Result<Self, ConfigError> {
        let mut config = if store.exists() {
            Self::load(store).await?
        } else {
            tracing::debug!(path = %store.path().display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
    }
}

/// The trait for loading configuration data.
pub trait Loader {
    /// Loads the configuration data.
    fn load(&self) -> impl Future<Output = Result<SyncConfig, ConfigError>> + Send;
}

/// The trait for saving configuration data.
pub trait Saver {
    /// Saves the configuration data.
    fn save(&self, config: &SyncConfig) -> impl Future<Output = Result<(), ConfigError>> + Send;
}

/// An implementation of [`Loader`] and [`Saver`] that reads and writes a configuration file.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new [`FileStore`] with the given path.
    ///
    /// [`SyncConfig`] data will be serialized and deserialized using the file
    /// extension: `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<String, ConfigError> {
        std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, contents: String) -> Result<(), ConfigError> {
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl Loader for FileStore {
    async fn load(&self) -> Result<SyncConfig, ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&self.read()?)?),
            Some("toml") => Ok(toml::from_str(&self.read()?)?),
            _ => Err(ConfigError::UnsupportedFormat(self.path.clone())),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &SyncConfig) -> Result<(), ConfigError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => self.write(serde_json::to_string_pretty(config)?),
            Some("toml") => self.write(toml::to_string_pretty(config)?),
            _ => Err(ConfigError::UnsupportedFormat(self.path.clone())),
        }
    }
}
