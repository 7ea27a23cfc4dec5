//! Configuration loading and validation for Loreweave.
//!
//! Loads configuration from `~/.loreweave/config.toml` with environment
//! variable overrides. Credentials are opaque strings and never appear in
//! `Debug` output.

pub mod schema;

pub use schema::{SettingChoice, SettingKind, SettingSchema};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.loreweave/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key shared by providers that have no per-provider key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default adapter when a request carries no `api_mode`.
    #[serde(default = "default_api_mode")]
    pub default_api_mode: String,

    /// Default context size for history truncation.
    #[serde(default = "default_context_size")]
    pub default_context_size: usize,

    /// Default lorebook token budget.
    #[serde(default = "default_lorebook_budget")]
    pub default_lorebook_budget: usize,

    /// Default lorebook scan depth.
    #[serde(default = "default_scan_depth")]
    pub default_scan_depth: usize,

    /// Provider-specific configurations keyed by api_mode.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_api_mode() -> String {
    "openai".into()
}
fn default_context_size() -> usize {
    4096
}
fn default_lorebook_budget() -> usize {
    512
}
fn default_scan_depth() -> usize {
    4
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_api_mode", &self.default_api_mode)
            .field("default_context_size", &self.default_context_size)
            .field("default_lorebook_budget", &self.default_lorebook_budget)
            .field("default_scan_depth", &self.default_scan_depth)
            .field("providers", &self.providers)
            .finish()
    }
}

/// Per-provider credentials and overrides.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (proxies, self-hosted gateways).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.loreweave/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `LOREWEAVE_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("LOREWEAVE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(mode) = std::env::var("LOREWEAVE_API_MODE") {
            config.default_api_mode = mode;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".loreweave")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_context_size == 0 {
            return Err(ConfigError::ValidationError(
                "default_context_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the API key for one provider, falling back to the shared key.
    pub fn api_key_for(&self, api_mode: &str) -> Option<String> {
        self.providers
            .get(api_mode)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Resolve the base-URL override for one provider, if any.
    pub fn api_url_for(&self, api_mode: &str) -> Option<String> {
        self.providers.get(api_mode).and_then(|p| p.api_url.clone())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_api_mode: default_api_mode(),
            default_context_size: default_context_size(),
            default_lorebook_budget: default_lorebook_budget(),
            default_scan_depth: default_scan_depth(),
            providers: HashMap::new(),
        }
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
