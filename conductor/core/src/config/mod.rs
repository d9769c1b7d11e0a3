//! TOML Configuration File Support
//!
//! Configuration for a teaching session, loaded from
//! `~/.config/ai-tutor/session.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (see [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Environment Variables
//!
//! - `TUTOR_API_URL` - API root
//! - `TUTOR_API_TOKEN` - bearer token from the login flow
//! - `TUTOR_TIMEOUT_SECS` - per-request timeout
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://tutor.example.edu"
//! timeout_secs = 60
//!
//! [session]
//! completion_buffer = 64
//! check_health_on_start = true
//! ```
//!
//! The token is never read from the file and never logged.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conductor::ConductorConfig;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[api]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// API root
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[session]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// Capacity of the completion channel
    pub completion_buffer: Option<usize>,

    /// Probe `/health` when the conductor starts
    pub check_health_on_start: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorToml {
    /// API section
    pub api: ApiToml,

    /// Session section
    pub session: SessionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// How to reach the tutor API
#[derive(Clone)]
pub struct ApiConfig {
    /// API root
    pub base_url: String,
    /// Bearer token, if logged in
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Complete configuration for a teaching session
#[derive(Clone, Debug)]
pub struct TutorConfig {
    /// API settings
    pub api: ApiConfig,

    /// Conductor settings
    pub conductor: ConductorConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            conductor: ConductorConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl TutorConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that would make the session unusable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.api.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.conductor.completion_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "session.completion_buffer must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/ai-tutor/session.toml` or
/// `~/.config/ai-tutor/session.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ai-tutor").join("session.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// result fails validation. A missing config file is not an error.
pub fn load_config() -> Result<TutorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the result fails validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<TutorConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration from a specific path, reading variables through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<TutorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = TutorConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: TutorToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut TutorConfig, toml: &TutorToml) {
    if let Some(ref url) = toml.api.base_url {
        config.api.base_url = url.clone();
    }
    if let Some(secs) = toml.api.timeout_secs {
        config.api.timeout = Duration::from_secs(secs);
    }

    if let Some(size) = toml.session.completion_buffer {
        config.conductor.completion_buffer = size;
    }
    if let Some(enabled) = toml.session.check_health_on_start {
        config.conductor.check_health_on_start = enabled;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut TutorConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("TUTOR_API_URL") {
        config.api.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(token) = env("TUTOR_API_TOKEN") {
        config.api.token = Some(token);
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("TUTOR_TIMEOUT_SECS") {
        match timeout.parse::<u64>() {
            Ok(secs) => {
                config.api.timeout = Duration::from_secs(secs);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid TUTOR_TIMEOUT_SECS"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    /// API root override
    pub base_url: Option<String>,

    /// Token override
    pub token: Option<String>,

    /// Timeout override (seconds)
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set API root override
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set token override
    #[must_use]
    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the overridden config is
    /// no longer valid.
    pub fn apply(&self, config: &mut TutorConfig) -> Result<(), ConfigError> {
        if self.base_url.is_some() || self.token.is_some() || self.timeout_secs.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.api.base_url = url.clone();
        }
        if let Some(ref token) = self.token {
            config.api.token = Some(token.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.api.timeout = Duration::from_secs(secs);
        }

        config.validate()
    }
}

impl std::fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
