//! Client configuration: backend base URL and session file location.
//!
//! The base URL is resolved once at startup. An explicit override wins;
//! otherwise it is derived from the page origin the client is serving, so
//! the same build works against a local backend and a deployed one.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use reqwest::Url;

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_API_PORT: u16 = 8000;
pub const API_PATH: &str = "/api";

const SESSION_DIR: &str = ".farmdesk";
const SESSION_FILE: &str = "session.json";

/// Errors produced while resolving client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The page origin could not be parsed as a URL.
    #[error("invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    /// The explicit API URL override is not an absolute URL.
    #[error("invalid API URL '{0}'")]
    InvalidApiUrl(String),
}

/// Protocol and hostname of the page the client runs under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageOrigin {
    /// Scheme including the trailing colon, e.g. `https:`.
    pub protocol: String,
    pub hostname: String,
}

impl PageOrigin {
    /// Parse an origin such as `https://farm.example.com:3000`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOrigin`] when the value is not an
    /// absolute URL with a host.
    pub fn parse(origin: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(origin.trim()).map_err(|e| ConfigError::InvalidOrigin {
            origin: origin.to_owned(),
            reason: e.to_string(),
        })?;
        let hostname = url.host_str().ok_or_else(|| ConfigError::InvalidOrigin {
            origin: origin.to_owned(),
            reason: "missing host".to_owned(),
        })?;
        Ok(Self { protocol: format!("{}:", url.scheme()), hostname: hostname.to_owned() })
    }
}

/// Resolve the backend base URL from an optional override and the page origin.
///
/// Loopback hostnames are normalised to `127.0.0.1`.
#[must_use]
pub fn resolve_base_url(api_url_override: Option<&str>, origin: &PageOrigin) -> String {
    if let Some(explicit) = api_url_override.map(str::trim).filter(|v| !v.is_empty()) {
        return explicit.trim_end_matches('/').to_owned();
    }

    let host = match origin.hostname.as_str() {
        "localhost" | "127.0.0.1" => "127.0.0.1",
        other => other,
    };
    format!("{}//{host}:{DEFAULT_API_PORT}{API_PATH}", origin.protocol)
}

/// Fully resolved client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Build a config from raw inputs (CLI flags or their env fallbacks).
    ///
    /// - `api_url`: `FARMDESK_API_URL`, wins when non-empty
    /// - `origin`: `FARMDESK_ORIGIN`, defaults to [`DEFAULT_ORIGIN`]
    /// - `session_file`: `FARMDESK_SESSION_FILE`, defaults to `$HOME/.farmdesk/session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if the origin cannot be parsed or the override is not
    /// an absolute URL.
    pub fn resolve(api_url: Option<&str>, origin: Option<&str>, session_file: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(explicit) = api_url.map(str::trim).filter(|v| !v.is_empty()) {
            Url::parse(explicit).map_err(|_| ConfigError::InvalidApiUrl(explicit.to_owned()))?;
        }
        let origin = PageOrigin::parse(origin.unwrap_or(DEFAULT_ORIGIN))?;
        let base_url = resolve_base_url(api_url, &origin);
        let session_file = session_file.unwrap_or_else(|| default_session_file(std::env::var_os("HOME").map(PathBuf::from)));
        Ok(Self { base_url, session_file })
    }
}

fn default_session_file(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) if !home.as_os_str().is_empty() => home.join(SESSION_DIR).join(SESSION_FILE),
        _ => PathBuf::from(SESSION_DIR).join(SESSION_FILE),
    }
}
