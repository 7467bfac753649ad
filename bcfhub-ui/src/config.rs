//! Runtime settings for bcfhub-ui
//!
//! Priority: CLI argument → environment variable → TOML → compiled default.
//! clap handles the first two tiers (each argument has an `env` fallback);
//! [`Settings::resolve`] layers the TOML file and defaults underneath.

use bcfhub_common::config::{write_toml_config, CompiledDefaults, LoggingConfig, TomlConfig};
use clap::Parser;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HubError, HubResult};
use crate::validation::ArchiveLimits;

/// BCF hub session service
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "bcfhub-ui", version, about)]
pub struct CliArgs {
    /// HTTP port to listen on
    #[arg(long, env = "BCFHUB_PORT")]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(long, env = "BCFHUB_BIND")]
    pub bind: Option<String>,

    /// Base URL of the BCF inspection/merge service
    #[arg(long, env = "BCFHUB_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Explicit path to bcfhub.toml
    #[arg(long, env = "BCFHUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the resolved settings to this TOML file and exit
    #[arg(long, value_name = "PATH")]
    pub write_config: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind: String,
    pub port: u16,
    pub service_url: String,
    pub request_timeout: Duration,
    pub limits: ArchiveLimits,
    pub event_capacity: usize,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(cli: &CliArgs, toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::new();

        Self {
            bind: cli
                .bind
                .clone()
                .or_else(|| toml.bind.clone())
                .unwrap_or(defaults.bind),
            port: cli.port.or(toml.port).unwrap_or(defaults.port),
            service_url: cli
                .service_url
                .clone()
                .or_else(|| toml.service_url.clone())
                .unwrap_or(defaults.service_url),
            // Zero would fail every service call or reject every upload
            request_timeout: Duration::from_secs(
                toml.request_timeout_secs
                    .filter(|&secs| secs > 0)
                    .unwrap_or(defaults.request_timeout_secs),
            ),
            limits: ArchiveLimits::new(
                toml.max_archive_bytes
                    .filter(|&bytes| bytes > 0)
                    .unwrap_or(defaults.max_archive_bytes),
            ),
            event_capacity: toml
                .event_capacity
                .filter(|&capacity| capacity > 0)
                .unwrap_or(defaults.event_capacity),
            log_level: toml.logging.level.clone(),
        }
    }

    /// Settings as a complete TOML config, every field filled in
    pub fn to_toml(&self) -> TomlConfig {
        TomlConfig {
            service_url: Some(self.service_url.clone()),
            bind: Some(self.bind.clone()),
            port: Some(self.port),
            request_timeout_secs: Some(self.request_timeout.as_secs()),
            max_archive_bytes: Some(self.limits.max_bytes),
            event_capacity: Some(self.event_capacity),
            logging: LoggingConfig {
                level: self.log_level.clone(),
            },
        }
    }

    /// Persist these settings as TOML at `path`
    pub fn write(&self, path: &Path) -> HubResult<()> {
        write_toml_config(&self.to_toml(), path)?;
        Ok(())
    }

    pub fn socket_addr(&self) -> HubResult<SocketAddr> {
        format!("{}:{}", self.bind, self.port)
            .parse()
            .map_err(|e| HubError::BadRequest(format!("invalid bind address: {}", e)))
    }
}
