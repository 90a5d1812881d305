//! Configuration management for snapslot
//!
//! Handles loading and validation of `snapslot.toml`. The loaded [`Config`] is
//! an explicit value handed to the orchestrator; nothing here is global.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::digitalocean::DEFAULT_API_URL;
use crate::error::{ConfigError, Result};
use crate::logging::LogConfig;
use crate::policy::RetentionPolicy;

/// File name looked up in the user config directory.
pub const CONFIG_FILE_NAME: &str = "snapslot.toml";

/// Prefix used for naming and filtering snapshots unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "auto-";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Provider API settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// What to back up and how long to keep it
    #[serde(default)]
    pub backup: BackupConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Provider API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API root URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            timeout: default_timeout(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Backup target and retention tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Name of the volume to snapshot
    #[serde(default)]
    pub volume: Option<String>,

    /// Snapshot name prefix, used for both naming and filtering
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Tier thresholds, tightest first
    #[serde(default)]
    pub thresholds: RetentionPolicy,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            volume: None,
            prefix: default_prefix(),
            thresholds: RetentionPolicy::default(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown log format: {s}. Expected one of: pretty, json")),
        }
    }
}

impl Config {
    /// Default config path: `$XDG_CONFIG_HOME/snapslot/snapslot.toml` or platform equivalent.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snapslot").join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit path, else the default path if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let path_str = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path_str.clone())
            } else {
                ConfigError::ReadFailed(path_str.clone(), e.to_string())
            }
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!(path = %path_str, "Loaded config");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseFailed(e.to_string()).into())
    }

    /// Check that everything a run needs is present.
    ///
    /// Thresholds are already validated when the file is parsed.
    pub fn validate(&self) -> Result<()> {
        self.token()?;
        self.volume()?;
        if !self.provider.api_url.starts_with("http://")
            && !self.provider.api_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(format!(
                "provider api_url must be an http(s) URL, got {}",
                self.provider.api_url
            ))
            .into());
        }
        if self.provider.timeout.is_zero() {
            return Err(
                ConfigError::ValidationError("provider timeout must be > 0".into()).into(),
            );
        }
        Ok(())
    }

    /// Configured token, or a validation error.
    pub fn token(&self) -> Result<&str> {
        self.provider
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(
                    "provider token is not set (use [provider].token, --token or SNAPSLOT_TOKEN)"
                        .into(),
                )
                .into()
            })
    }

    /// Configured volume name, or a validation error.
    pub fn volume(&self) -> Result<&str> {
        self.backup
            .volume
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::ValidationError(
                    "backup volume is not set (use [backup].volume, --volume or SNAPSLOT_VOLUME)"
                        .into(),
                )
                .into()
            })
    }
}
