//! Configuration for the watcher and the model backend.
//!
//! The configuration is a YAML document:
//!
//! ```yaml
//! watch_directory: data
//! output_directory: output
//! model_settings:
//!   model_name: mistral
//!   base_url: http://localhost:11434
//!   # request_timeout_secs: 300
//! ```
//!
//! Use [`AppConfig::load`] for files and [`AppConfig::builder`] in code.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default model served by the local backend.
pub const DEFAULT_MODEL: &str = "mistral";

/// Default local inference endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Environment variable overriding `model_settings.model_name`.
pub const ENV_MODEL: &str = "WATCH_ANALYST_MODEL";

/// Environment variable overriding `model_settings.base_url`.
pub const ENV_BASE_URL: &str = "WATCH_ANALYST_BASE_URL";

/// Settings for the local model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model name as known to the backend (e.g., "mistral", "llama3").
    pub model_name: String,
    /// Base URL of the backend, without the `/api/generate` suffix.
    pub base_url: String,
    /// Client-side request timeout. `None` leaves requests unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory observed for newly created files (non-recursive).
    pub watch_directory: PathBuf,
    /// Directory receiving `analyse_*.txt` and `empfehlungen_*.json`.
    pub output_directory: PathBuf,
    /// Model backend settings.
    pub model_settings: ModelSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watch_directory: PathBuf::from("data"),
            output_directory: PathBuf::from("output"),
            model_settings: ModelSettings::default(),
        }
    }
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing value for '{0}'")]
    MissingField(&'static str),

    #[error("Invalid base URL '{0}' (must start with http:// or https://)")]
    InvalidBaseUrl(String),

    #[error("Invalid request timeout: {0} (must be at least 1 second)")]
    InvalidTimeout(u64),
}

impl AppConfig {
    /// Create a new configuration builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_yaml(&contents)?;
        debug!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WATCH_ANALYST_MODEL` / `WATCH_ANALYST_BASE_URL` and re-validate.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(
            std::env::var(ENV_MODEL).ok(),
            std::env::var(ENV_BASE_URL).ok(),
        )
    }

    fn with_overrides(
        mut self,
        model_name: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(model_name) = model_name {
            debug!(%model_name, "Model name overridden from environment");
            self.model_settings.model_name = model_name;
        }
        if let Some(base_url) = base_url {
            debug!(%base_url, "Base URL overridden from environment");
            self.model_settings.base_url = base_url;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("watch_directory"));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("output_directory"));
        }
        if self.model_settings.model_name.trim().is_empty() {
            return Err(ConfigError::MissingField("model_settings.model_name"));
        }

        let base_url = &self.model_settings.base_url;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url.clone()));
        }

        if let Some(0) = self.model_settings.request_timeout_secs {
            return Err(ConfigError::InvalidTimeout(0));
        }

        Ok(())
    }

    /// Create the watch and output directories if they do not exist yet.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.watch_directory, &self.output_directory] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                info!("Created directory: {}", dir.display());
            }
        }
        Ok(())
    }
}

/// Builder for [`AppConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    watch_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    model_name: Option<String>,
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl AppConfigBuilder {
    /// Set the directory to watch.
    pub fn watch_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch_directory = Some(path.into());
        self
    }

    /// Set the directory receiving the analysis outputs.
    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(path.into());
        self
    }

    /// Set the model name.
    pub fn model_name(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Set the backend base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Bound each inference request to `secs` seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `AppConfig` or an error if validation fails.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            watch_directory: self.watch_directory.unwrap_or(defaults.watch_directory),
            output_directory: self.output_directory.unwrap_or(defaults.output_directory),
            model_settings: ModelSettings {
                model_name: self
                    .model_name
                    .unwrap_or(defaults.model_settings.model_name),
                base_url: self.base_url.unwrap_or(defaults.model_settings.base_url),
                request_timeout_secs: self.request_timeout_secs,
            },
        };

        config.validate()?;
        Ok(config)
    }
}
