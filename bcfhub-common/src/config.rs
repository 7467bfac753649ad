//! Bootstrap configuration loading
//!
//! Settings are resolved in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by the binary's argument parser; this module
//! owns the TOML file and the compiled defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file name searched in the platform config directory
pub const CONFIG_FILE_NAME: &str = "bcfhub.toml";

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the external inspection/merge service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    /// Address the HTTP API binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,

    /// HTTP API port
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Timeout applied to each call to the external service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Largest archive accepted for upload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_archive_bytes: Option<u64>,

    /// Event bus capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_capacity: Option<usize>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Built-in defaults used when no other tier provides a value
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub service_url: String,
    pub bind: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_archive_bytes: u64,
    pub event_capacity: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn new() -> Self {
        Self {
            service_url: "http://127.0.0.1:8000".to_string(),
            bind: "127.0.0.1".to_string(),
            port: 5780,
            request_timeout_secs: 120,
            max_archive_bytes: 100 * 1024 * 1024,
            event_capacity: 256,
            log_level: default_log_level(),
        }
    }
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// Locate the TOML config file for the current platform
///
/// Linux checks `~/.config/bcfhub/bcfhub.toml` then `/etc/bcfhub/bcfhub.toml`.
/// Other platforms check the user config directory only.
pub fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bcfhub").join(CONFIG_FILE_NAME));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bcfhub").join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the bootstrap config came from
///
/// Returned by [`load_or_default`] so the caller can report it once logging
/// is up.
#[derive(Debug)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file given and none found in the default locations
    Defaults,
    /// A file was found or named but could not be used
    Fallback { path: PathBuf, error: Error },
}

impl ConfigSource {
    /// Log how the config was obtained; fallbacks are warnings
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Defaults => {
                info!("No {} found, using built-in defaults", CONFIG_FILE_NAME)
            }
            ConfigSource::Fallback { path, error } => warn!(
                "Ignoring {}: {} (continuing with defaults)",
                path.display(),
                error
            ),
        }
    }
}

/// Load the bootstrap config, degrading to defaults on any problem
///
/// Nothing is logged here; see [`ConfigSource::log`].
pub fn load_or_default(explicit: Option<&Path>) -> (TomlConfig, ConfigSource) {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match find_config_file() {
            Ok(path) => path,
            Err(_) => return (TomlConfig::default(), ConfigSource::Defaults),
        },
    };

    match load_toml_config(&path) {
        Ok(config) => (config, ConfigSource::File(path)),
        Err(error) => (TomlConfig::default(), ConfigSource::Fallback { path, error }),
    }
}

/// Write a TOML config atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}
