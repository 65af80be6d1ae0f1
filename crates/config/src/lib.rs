//! Configuration loading, validation, and management for Cardpress.
//!
//! Loads configuration from `~/.cardpress/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.cardpress/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Authoring system the content records are fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Cacheable destination the published artifacts are written to
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Default static token table, merged under each invocation's own table
    #[serde(default)]
    pub tokens: BTreeMap<String, String>,

    /// Outbound HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the authoring system, e.g. `https://author.example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Bearer token for reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("token", &redact(&self.token))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Base URL of the destination, e.g. `https://publish.example.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Bearer token for writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Path under which `<cardId>.json` artifacts are written
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "/content/cards".into()
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host: None,
            token: None,
            prefix: default_prefix(),
        }
    }
}

impl std::fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("host", &self.host)
            .field("token", &redact(&self.token))
            .field("prefix", &self.prefix)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Upper bound for each fetch or write, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// When set, `/v1` routes require `Authorization: Bearer <api_token>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            api_token: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("api_token", &redact(&self.api_token))
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.cardpress/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CARDPRESS_SOURCE_HOST`, `CARDPRESS_SOURCE_TOKEN`
    /// - `CARDPRESS_DESTINATION_HOST`, `CARDPRESS_DESTINATION_TOKEN`
    /// - `CARDPRESS_API_TOKEN`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup. Blank values are ignored.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("CARDPRESS_SOURCE_HOST") {
            self.source.host = Some(host);
        }
        if let Some(token) = get("CARDPRESS_SOURCE_TOKEN") {
            self.source.token = Some(token);
        }
        if let Some(host) = get("CARDPRESS_DESTINATION_HOST") {
            self.destination.host = Some(host);
        }
        if let Some(token) = get("CARDPRESS_DESTINATION_TOKEN") {
            self.destination.token = Some(token);
        }
        if let Some(token) = get("CARDPRESS_API_TOKEN") {
            self.gateway.api_token = Some(token);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".cardpress")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }

        if !self.destination.prefix.is_empty() && !self.destination.prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "destination.prefix must start with '/'".into(),
            ));
        }

        for (label, host) in [
            ("source.host", &self.source.host),
            ("destination.host", &self.destination.host),
        ] {
            if let Some(host) = host
                && !host.starts_with("http://")
                && !host.starts_with("https://")
            {
                return Err(ConfigError::ValidationError(format!(
                    "{label} must start with http:// or https://"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let mut config = Self::default();
        config.source.host = Some("https://author.example.com".into());
        config.destination.host = Some("https://publish.example.com".into());
        config
            .tokens
            .insert("env.brand".into(), "Example Co".into());
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
