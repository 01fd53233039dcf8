//! Server configuration loaded from the environment.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_STORAGE_DIR: &str = "./results";
const DEFAULT_MAX_SOURCE_BYTES: u64 = 50 * 1024 * 1024;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Runtime settings for `muto-server`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Root directory of the local object store
    pub storage_dir: PathBuf,
    /// Prefix of published result URLs
    pub public_base_url: String,
    pub max_source_bytes: u64,
    pub source_timeout: Duration,
    /// Read `file://` sources from the server's disk
    pub allow_file_sources: bool,
    /// Largest width x height any command may produce
    pub max_pixels: u64,
    /// Narrows fallback dispatch to these capability names when set
    pub fallback_capabilities: Option<HashSet<String>>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            public_base_url: default_public_base_url(DEFAULT_PORT),
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            allow_file_sources: false,
            max_pixels: DEFAULT_MAX_PIXELS,
            fallback_capabilities: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

fn default_public_base_url(port: u16) -> String {
    format!("http://localhost:{port}/results")
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", format!("not a port number: {port}")))?;
        }
        if let Some(bind) = get("MUTO_BIND") {
            config.bind = bind
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("MUTO_BIND", format!("not an IP address: {bind}")))?;
        }
        if let Some(dir) = get("MUTO_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        config.public_base_url = get("MUTO_PUBLIC_BASE_URL")
            .unwrap_or_else(|| default_public_base_url(config.port));
        if let Some(max) = get("MUTO_MAX_SOURCE_BYTES") {
            config.max_source_bytes = parse_positive("MUTO_MAX_SOURCE_BYTES", &max)?;
        }
        if let Some(secs) = get("MUTO_SOURCE_TIMEOUT_SECS") {
            config.source_timeout =
                Duration::from_secs(parse_positive("MUTO_SOURCE_TIMEOUT_SECS", &secs)?);
        }
        if let Some(allow) = get("MUTO_ALLOW_FILE_SOURCES") {
            config.allow_file_sources = parse_bool("MUTO_ALLOW_FILE_SOURCES", &allow)?;
        }
        if let Some(max) = get("MUTO_MAX_PIXELS") {
            config.max_pixels = parse_positive("MUTO_MAX_PIXELS", &max)?;
        }
        if let Some(names) = get("MUTO_FALLBACK_CAPABILITIES") {
            config.fallback_capabilities = Some(
                names
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(level) = get("MUTO_LOG") {
            config.log_level = level;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::invalid(var, format!("expected a positive integer, got {value}"))),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, format!("expected a boolean, got {value}"))),
    }
}
