//! Host configuration from environment variables

use std::path::PathBuf;
use thiserror::Error;
use tracing::Level;

use webauthn_bridge_core::{ClassifierPatterns, MIN_SUPPORTED_API_LEVEL};

pub const ENV_LOG_LEVEL: &str = "WEBAUTHN_BRIDGE_LOG_LEVEL";
pub const ENV_API_LEVEL: &str = "WEBAUTHN_BRIDGE_API_LEVEL";
pub const ENV_MIN_API_LEVEL: &str = "WEBAUTHN_BRIDGE_MIN_API_LEVEL";
pub const ENV_CANCEL_PATTERNS: &str = "WEBAUTHN_BRIDGE_CANCEL_PATTERNS";
pub const ENV_NO_PROVIDER_PATTERNS: &str = "WEBAUTHN_BRIDGE_NO_PROVIDER_PATTERNS";
pub const ENV_FIXTURES: &str = "WEBAUTHN_BRIDGE_FIXTURES";

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read fixtures from {}: {source}", .path.display())]
    FixtureRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixtures from {}: {source}", .path.display())]
    FixtureParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Host configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub log_level: Level,
    /// API level reported by the (simulated) platform
    pub api_level: u32,
    /// Lowest API level answering `available: true`
    pub min_api_level: u32,
    pub patterns: ClassifierPatterns,
    /// Fixture file scripting the simulated platform
    pub fixtures: Option<PathBuf>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            api_level: MIN_SUPPORTED_API_LEVEL,
            min_api_level: MIN_SUPPORTED_API_LEVEL,
            patterns: ClassifierPatterns::default(),
            fixtures: None,
        }
    }
}

impl HostConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            config.log_level = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_LOG_LEVEL,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_API_LEVEL) {
            config.api_level = parse_level(ENV_API_LEVEL, value)?;
        }
        if let Some(value) = lookup(ENV_MIN_API_LEVEL) {
            config.min_api_level = parse_level(ENV_MIN_API_LEVEL, value)?;
        }
        if let Some(value) = lookup(ENV_CANCEL_PATTERNS) {
            config.patterns.cancellation = parse_patterns(ENV_CANCEL_PATTERNS, value)?;
        }
        if let Some(value) = lookup(ENV_NO_PROVIDER_PATTERNS) {
            config.patterns.no_providers = parse_patterns(ENV_NO_PROVIDER_PATTERNS, value)?;
        }
        config.fixtures = lookup(ENV_FIXTURES)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn parse_level(key: &'static str, value: String) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

fn parse_patterns(key: &'static str, value: String) -> Result<Vec<String>, ConfigError> {
    let patterns: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if patterns.is_empty() {
        return Err(ConfigError::InvalidValue { key, value });
    }
    Ok(patterns)
}
