//! Process configuration
//!
//! Everything here is resolved once at startup and handed to the server by
//! value. Nothing in this module is consulted per request.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides the backend API origin.
pub const BACKEND_URL_VAR: &str = "NEXT_PUBLIC_API_URL";

/// Backend origin used when [`BACKEND_URL_VAR`] is unset or empty.
pub const DEFAULT_BACKEND_URL: &str = "https://treehacks-api-production.up.railway.app";

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_VAR: &str = "WAYPOINT_CONFIG";

/// Environment variable that overrides the listen address.
pub const LISTEN_VAR: &str = "LISTEN";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BODY_BYTES: usize = crate::http::parser::MAX_BODY_BYTES;

/// Absolute URL of the backend API origin (e.g. "https://backend.example").
///
/// The value is kept exactly as it was supplied. It is not parsed or
/// normalized, so a malformed override only shows up once a request is
/// forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAddress(String);

impl BackendAddress {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address parses as an absolute URL with a host.
    ///
    /// Only used to warn at startup; an invalid address is still used as-is.
    pub fn looks_valid(&self) -> bool {
        url::Url::parse(&self.0)
            .map(|u| u.has_host())
            .unwrap_or(false)
    }
}

impl fmt::Display for BackendAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the backend address from the process environment.
pub fn resolve_backend_address() -> BackendAddress {
    resolve_backend_address_with(|key| std::env::var(key).ok())
}

/// Resolves the backend address from an arbitrary environment lookup.
///
/// A present, non-empty value wins verbatim. Anything else (unset, empty,
/// not valid unicode) falls back to [`DEFAULT_BACKEND_URL`].
pub fn resolve_backend_address_with<F>(lookup: F) -> BackendAddress
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(BACKEND_URL_VAR) {
        Some(value) if !value.is_empty() => BackendAddress(value),
        _ => BackendAddress(DEFAULT_BACKEND_URL.to_string()),
    }
}

/// Listener and forwarding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Largest request body accepted from a client; larger ones get 413.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendAddress,
}

/// On-disk shape of the optional YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    server: FileServerConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileServerConfig {
    listen_addr: Option<String>,
    connect_timeout_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    max_body_bytes: Option<usize>,
}

impl FileServerConfig {
    fn apply(self, server: &mut ServerConfig) {
        if let Some(addr) = self.listen_addr {
            server.listen_addr = addr;
        }
        if let Some(secs) = self.connect_timeout_secs {
            server.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            server.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = self.max_body_bytes {
            server.max_body_bytes = bytes;
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary environment lookup.
    ///
    /// Precedence for the listen address: `LISTEN`, then the YAML file named
    /// by `WAYPOINT_CONFIG`, then the built-in default. The backend address
    /// is resolved from the same lookup.
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut server = ServerConfig::default();

        if let Some(path) = lookup(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            Self::read_file(Path::new(&path))?.server.apply(&mut server);
        }

        if let Some(addr) = lookup(LISTEN_VAR).filter(|a| !a.is_empty()) {
            server.listen_addr = addr;
        }

        Ok(Self {
            server,
            backend: resolve_backend_address_with(lookup),
        })
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        // An empty file deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(FileConfig::default());
        }

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }
}
