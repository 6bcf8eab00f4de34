#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! MIML Configuration
//!
//! This crate provides configuration management for the wiring compiler.
//! It handles loading, saving, and locating configuration files that specify:
//! - The header search path
//! - The framework root used by the regeneration rule
//! - Output artifact file names
//! - An optional external C preprocessor invocation
//! - Logging configuration
//!
//! Configuration is stored in TOML format. Every key is optional.

use std::path::{Path, PathBuf};

use ir::{DocumentTree, OutputNames, Section};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the configuration file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "cg.toml";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Header search directories, tried in order before the working directory
    pub include: Vec<String>,
    /// Framework root; the regeneration rule invokes `<framework>/mimlc`
    pub framework: String,
    /// Arguments for the external C preprocessor. When unset, headers are
    /// scanned directly without preprocessing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpp: Option<Vec<String>>,
    /// Output artifact names
    pub filenames: OutputNames,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "warn".to_string() } }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            framework: ".".to_string(),
            cpp: None,
            filenames: OutputNames::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Returns the default config file path:
    /// `{config_dir()}/miml/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("miml");
        Ok(config_dir.join("config.toml"))
    }

    /// Load the configuration the CLI should use.
    ///
    /// An explicit path must exist. Without one, `cg.toml` in the working
    /// directory is used, then the user config file, then the defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_or_default_internal(explicit, Path::new(LOCAL_CONFIG), Self::default_path().ok())
    }

    /// Internal function for testing - allows injection of lookup locations
    fn load_or_default_internal(
        explicit: Option<&Path>,
        local: &Path,
        user: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::from_file(path);
        }

        if local.exists() {
            return Self::from_file(local);
        }

        match user {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Echo the configuration into a document tree. Sections the wiring
    /// document already sets are left alone.
    pub fn apply_to(&self, tree: &mut DocumentTree) {
        tree.insert_default(Section::Include(self.include.clone()));
        tree.insert_default(Section::Framework(self.framework.clone()));
        tree.insert_default(Section::Filenames(self.filenames.clone()));
    }
}
