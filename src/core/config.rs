//! Configuration management for the field graph
//!
//! Settings come from defaults, an optional TOML file and `FG_*` environment
//! variables, applied in that order.

use crate::core::error::{Error, Result};
use crate::core::utils::parse_flag;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file looked up by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "field-graph.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON writer and reader settings
    pub serializer: SerializerConfig,

    /// Object graph settings
    pub graph: GraphConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// JSON serializer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Emit each object's `uuid`
    pub write_uuids: bool,

    /// Emit the in-process `serverAddress` token
    pub write_server_address: bool,

    /// Pretty-print documents
    pub pretty: bool,

    /// Emit the portable `type` tag on every field entry
    pub write_type_tags: bool,
}

/// Object graph configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Give every new object a fresh v4 UUID
    pub assign_uuids: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, compact)
    pub format: String,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            write_uuids: true,
            write_server_address: false,
            pretty: false,
            write_type_tags: true,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { assign_uuids: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment variables
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            config = Self::from_file(DEFAULT_CONFIG_FILE)?;
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `FG_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(level) = env::var("FG_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = env::var("FG_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(flag) = env::var("FG_WRITE_UUIDS") {
            self.serializer.write_uuids = parse_flag(&flag)
                .ok_or_else(|| Error::config(format!("Invalid FG_WRITE_UUIDS value: {}", flag)))?;
        }

        if let Ok(flag) = env::var("FG_PRETTY_JSON") {
            self.serializer.pretty = parse_flag(&flag)
                .ok_or_else(|| Error::config(format!("Invalid FG_PRETTY_JSON value: {}", flag)))?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => return Err(Error::config("Invalid log level")),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => return Err(Error::config("Invalid log format")),
        }

        Ok(())
    }
}

/// Load configuration from `path`, or the default file and environment when `None`
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
        None => Config::load(),
    }
}

/// Load configuration, falling back to defaults on any failure
pub fn load_config_or_default(path: Option<&str>) -> Config {
    match load_config(path) {
        Ok(config) => {
            crate::log_info!("Configuration loaded");
            config
        }
        Err(e) => {
            crate::log_warn!("Failed to load configuration ({}), using defaults", e);
            Config::default()
        }
    }
}
