//! TOML Configuration File Support
//!
//! Configuration for the chat client, loaded from
//! `$XDG_CONFIG_HOME/chatbox/config.toml` (typically
//! `~/.config/chatbox/config.toml`).
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`CHATBOX_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:3000"
//! endpoint_path = "/api/chat"
//! timeout_ms = 30000
//!
//! [chat]
//! variant = "role-tagged"
//! bot_label = "Gemini"
//! fallback_message = "Sorry, I encountered an error. Please try again."
//! # session_id = "pinned01"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conductor::{ConductorConfig, DEFAULT_BOT_LABEL, DEFAULT_FALLBACK_MESSAGE};
use crate::messages::SessionId;
use crate::variant::VariantKind;

/// Default backend origin
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default chat endpoint path
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/chat";

const ENV_BASE_URL: &str = "CHATBOX_BASE_URL";
const ENV_ENDPOINT_PATH: &str = "CHATBOX_ENDPOINT_PATH";
const ENV_TIMEOUT_MS: &str = "CHATBOX_TIMEOUT_MS";
const ENV_VARIANT: &str = "CHATBOX_VARIANT";
const ENV_SESSION_ID: &str = "CHATBOX_SESSION_ID";
const ENV_BOT_LABEL: &str = "CHATBOX_BOT_LABEL";

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

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Origin of the chat server
    pub base_url: Option<String>,

    /// Path of the chat endpoint
    pub endpoint_path: Option<String>,

    /// Request timeout in milliseconds (0 = no timeout)
    pub timeout_ms: Option<u64>,
}

/// Chat section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatToml {
    /// Transcript shape
    pub variant: Option<VariantKind>,

    /// Bot text shown when a role-tagged request fails
    pub fallback_message: Option<String>,

    /// Label shown next to bot replies
    pub bot_label: Option<String>,

    /// Pinned session id
    pub session_id: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatboxToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Chat configuration section
    pub chat: ChatToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Where and how to reach the chat endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendSettings {
    /// Origin of the chat server, e.g. `http://localhost:3000`
    pub base_url: String,
    /// Endpoint path, e.g. `/api/chat`
    pub endpoint_path: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            timeout: None,
        }
    }
}

/// Resolved client configuration
///
/// Use [`load_config`] to build one with proper priority handling.
#[derive(Clone, Debug)]
pub struct ChatboxConfig {
    /// Backend endpoint settings
    pub backend: BackendSettings,

    /// Transcript shape
    pub variant: VariantKind,

    /// Bot text shown when a role-tagged request fails
    pub fallback_message: String,

    /// Label shown next to bot replies
    pub bot_label: String,

    /// Pinned session id (generated per conductor when `None`)
    pub session_id: Option<String>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ChatboxConfig {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            variant: VariantKind::default(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            bot_label: DEFAULT_BOT_LABEL.to_string(),
            session_id: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChatboxConfig {
    /// Create a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that would only fail later at request time
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.backend.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "base_url must start with http:// or https:// (got '{url}')"
            )));
        }
        if !self.backend.endpoint_path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "endpoint_path must start with '/' (got '{}')",
                self.backend.endpoint_path
            )));
        }
        if matches!(&self.session_id, Some(id) if id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "session_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for a conductor built from this configuration
    #[must_use]
    pub fn conductor_config(&self) -> ConductorConfig {
        ConductorConfig {
            fallback_message: self.fallback_message.clone(),
            session_id: self.session_id.as_deref().map(SessionId::from),
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/chatbox/config.toml` or
/// `~/.config/chatbox/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chatbox").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resolved values fail validation. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<ChatboxConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// `None` skips the file and uses only defaults and environment variables.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the resolved
/// values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChatboxConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration from a file the user named explicitly
///
/// Unlike [`load_config_from_path`], a missing file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file does not exist or cannot
/// be read, and the errors of [`load_config_from_path`] otherwise.
pub fn load_config_file(path: PathBuf) -> Result<ChatboxConfig, ConfigError> {
    require_file(&path)?;
    load_config_from_path(Some(path))
}

fn require_file(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        return Ok(());
    }
    Err(ConfigError::ReadError {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such config file"),
    })
}

fn load_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ChatboxConfig, ConfigError> {
    let mut config = ChatboxConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ChatboxToml = toml::from_str(&toml_content)?;
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

fn timeout_from_ms(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn apply_toml_config(config: &mut ChatboxConfig, toml: &ChatboxToml) {
    if let Some(ref url) = toml.backend.base_url {
        config.backend.base_url = url.clone();
    }
    if let Some(ref path) = toml.backend.endpoint_path {
        config.backend.endpoint_path = path.clone();
    }
    if let Some(ms) = toml.backend.timeout_ms {
        config.backend.timeout = timeout_from_ms(ms);
    }

    if let Some(variant) = toml.chat.variant {
        config.variant = variant;
    }
    if let Some(ref text) = toml.chat.fallback_message {
        config.fallback_message = text.clone();
    }
    if let Some(ref label) = toml.chat.bot_label {
        config.bot_label = label.clone();
    }
    if toml.chat.session_id.is_some() {
        config.session_id = toml.chat.session_id.clone();
    }
}

fn apply_env_config(config: &mut ChatboxConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(url) = env(ENV_BASE_URL) {
        config.backend.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = env(ENV_ENDPOINT_PATH) {
        config.backend.endpoint_path = path;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env(ENV_TIMEOUT_MS) {
        match timeout.parse::<u64>() {
            Ok(ms) => {
                config.backend.timeout = timeout_from_ms(ms);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid {ENV_TIMEOUT_MS}"),
        }
    }
    if let Some(variant) = env(ENV_VARIANT) {
        match variant.parse::<VariantKind>() {
            Ok(kind) => {
                config.variant = kind;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring invalid {ENV_VARIANT}"),
        }
    }
    if let Some(id) = env(ENV_SESSION_ID) {
        config.session_id = Some(id);
        config.source = ConfigSource::Env;
    }
    if let Some(label) = env(ENV_BOT_LABEL) {
        config.bot_label = label;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`]; call [`ChatboxConfig::validate`] again
/// once overrides are applied.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Base URL override
    pub base_url: Option<String>,

    /// Endpoint path override
    pub endpoint_path: Option<String>,

    /// Timeout override in milliseconds (0 = none)
    pub timeout_ms: Option<u64>,

    /// Variant override
    pub variant: Option<VariantKind>,

    /// Pinned session id override
    pub session_id: Option<String>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set endpoint path override
    #[must_use]
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = Some(path.into());
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Set variant override
    #[must_use]
    pub fn with_variant(mut self, variant: VariantKind) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Set session id override
    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.base_url.is_none()
            && self.endpoint_path.is_none()
            && self.timeout_ms.is_none()
            && self.variant.is_none()
            && self.session_id.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ChatboxConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.backend.base_url = url.clone();
        }
        if let Some(ref path) = self.endpoint_path {
            config.backend.endpoint_path = path.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.backend.timeout = timeout_from_ms(ms);
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(ref id) = self.session_id {
            config.session_id = Some(id.clone());
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
