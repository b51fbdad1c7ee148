//! Client configuration
//!
//! Layered as defaults, then an optional TOML file, then environment
//! variables; the binary applies its command-line flags last.

use crate::error::{CourseHubError, CourseHubResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_API_BASE_URL: &str = "COURSEHUB_API_BASE_URL";
pub const ENV_DATA_DIR: &str = "COURSEHUB_DATA_DIR";
pub const ENV_TIMEOUT_SECONDS: &str = "COURSEHUB_TIMEOUT_SECONDS";

/// Complete client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Backend endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to. Required.
    pub base_url: Option<String>,
    /// Request timeout; `None` leaves it to the transport
    pub timeout_seconds: Option<u64>,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_seconds: None,
            user_agent: format!("coursehub/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiConfig {
    /// The validated base URL, without a trailing slash
    pub fn base_url(&self) -> CourseHubResult<String> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CourseHubError::Config {
                message: format!("Missing environment variable: {}", ENV_API_BASE_URL),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("base_url")
                    .with_suggestion("Set api.base_url in the config file")
                    .with_suggestion("Or export COURSEHUB_API_BASE_URL"),
            })?;

        let parsed = Url::parse(raw).map_err(|e| CourseHubError::Config {
            message: format!("Invalid API base URL '{}': {}", raw, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("base_url"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CourseHubError::Config {
                message: format!("Unsupported URL scheme for API base URL: {}", parsed.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("base_url")
                    .with_suggestion("Use an http:// or https:// URL"),
            });
        }

        Ok(raw.trim_end_matches('/').to_string())
    }
}

/// Where the persisted session lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("coursehub").to_string_lossy().into_owned())
            .unwrap_or_else(|| "~/.coursehub".to_string());
        Self { data_dir }
    }
}

impl StorageConfig {
    /// Data directory with a leading `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.data_dir)
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CourseHubResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CourseHubError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: ClientConfig = toml::from_str(&content).map_err(|e| CourseHubError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> CourseHubResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| CourseHubError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| CourseHubError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env(self) -> CourseHubResult<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary variable source
    pub fn apply_vars<F>(mut self, lookup: F) -> CourseHubResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            self.api.base_url = Some(base_url);
        }
        if let Some(data_dir) = lookup(ENV_DATA_DIR) {
            self.storage.data_dir = data_dir;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECONDS) {
            let seconds = timeout.trim().parse::<u64>().map_err(|e| CourseHubError::Config {
                message: format!("Invalid {}: {}", ENV_TIMEOUT_SECONDS, e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("config").with_operation("apply_env"),
            })?;
            self.api.timeout_seconds = Some(seconds);
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> CourseHubResult<()> {
        self.api.base_url()?;

        if self.api.timeout_seconds == Some(0) {
            return Err(CourseHubError::Config {
                message: "api.timeout_seconds must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Remove the setting to leave timeouts to the transport"),
            });
        }

        if self.storage.data_dir.trim().is_empty() {
            return Err(CourseHubError::Config {
                message: "storage.data_dir must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
