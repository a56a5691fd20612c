//! Client configuration and base URL resolution.
//!
//! The base URL is resolved once at startup with this precedence:
//!
//! 1. `API_URL` environment override - must carry an http/https scheme and
//!    is normalized to end in `/api`
//! 2. In a production build with no override: refuse to start. Shipping a
//!    build that silently talks to localhost is a configuration error.
//! 3. Development default: `http://<host>:<port>/api`, host `127.0.0.1`
//!    (or `10.0.2.2`, the loopback alias seen from the emulated Android
//!    host), port `3001`, overridable via `API_HOST` / `API_PORT`.
//!
//! A TOML file form ([`ConfigFile`]) feeds the same resolution for the
//! CLI.

use ledger_types::ApiError;
use serde::Deserialize;
use std::time::Duration;

/// Default development port.
pub const DEFAULT_PORT: u16 = 3001;
/// Development host for ordinary targets.
pub const DEV_HOST: &str = "127.0.0.1";
/// Loopback alias of the host machine as seen from the Android emulator.
pub const ANDROID_EMULATOR_HOST: &str = "10.0.2.2";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(90);

/// Whether this is a development or production build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Debug builds: development defaults allowed.
    Development,
    /// Release builds: an explicit `API_URL` is required.
    Production,
}

impl BuildMode {
    /// The mode this binary was compiled in.
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Fully resolved base URL, ending in `/api`, no trailing slash.
    pub base_url: String,
    /// Timeout for ordinary requests (default 10 s).
    pub request_timeout: Duration,
    /// Timeout for multipart uploads (default 90 s): bodies are large and
    /// mobile uplinks are slow.
    pub upload_timeout: Duration,
}

impl ClientConfig {
    /// Resolve from the process environment and compile-time build mode.
    pub fn resolve() -> Result<Self, ApiError> {
        Self::resolve_with(
            |name| std::env::var(name).ok(),
            BuildMode::current(),
            cfg!(target_os = "android"),
        )
    }

    /// Resolve with explicit environment lookup, build mode, and target
    /// (testable form of [`resolve`](Self::resolve)).
    pub fn resolve_with(
        lookup: impl Fn(&str) -> Option<String>,
        mode: BuildMode,
        android_emulator: bool,
    ) -> Result<Self, ApiError> {
        let base_url = match lookup("API_URL") {
            Some(url) => normalize_base_url(&url)?,
            None => {
                if mode == BuildMode::Production {
                    return Err(ApiError::Configuration(
                        "API_URL must be set in production builds".into(),
                    ));
                }
                let host = lookup("API_HOST").unwrap_or_else(|| {
                    if android_emulator {
                        ANDROID_EMULATOR_HOST.to_string()
                    } else {
                        DEV_HOST.to_string()
                    }
                });
                let port = match lookup("API_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| {
                        ApiError::Configuration(format!("invalid API_PORT: {raw}"))
                    })?,
                    None => DEFAULT_PORT,
                };
                format!("http://{host}:{port}/api")
            }
        };
        Ok(Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        })
    }

    /// Build a config directly from a base URL (CLI and tests).
    pub fn with_base_url(url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: normalize_base_url(url)?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
        })
    }
}

/// Validate the scheme and normalize to a `/api` suffix with no trailing
/// slash.
fn normalize_base_url(url: &str) -> Result<String, ApiError> {
    let trimmed = url.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ApiError::Configuration(format!(
            "API_URL must include an http or https scheme, got: {trimmed}"
        )));
    }
    let mut base = trimmed.trim_end_matches('/').to_string();
    if !base.ends_with("/api") {
        base.push_str("/api");
    }
    Ok(base)
}

/// TOML configuration file for the CLI.
///
/// All fields optional; missing values fall back to the same defaults as
/// environment resolution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Explicit base URL override (same normalization as `API_URL`).
    #[serde(default)]
    pub api_url: Option<String>,
    /// Development host override.
    #[serde(default)]
    pub host: Option<String>,
    /// Development port override.
    #[serde(default)]
    pub port: Option<u16>,
    /// Whether sync passes start automatically on reconnect.
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,
}

fn default_auto_sync() -> bool {
    true
}

impl ConfigFile {
    /// Load from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ApiError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::Configuration(format!("failed to read config file {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            ApiError::Configuration(format!("failed to parse config file {}: {e}", path.display()))
        })
    }

    /// Resolve a [`ClientConfig`], file values taking the role of the
    /// environment overrides.
    pub fn client_config(&self, mode: BuildMode) -> Result<ClientConfig, ApiError> {
        ClientConfig::resolve_with(
            |name| match name {
                "API_URL" => self.api_url.clone(),
                "API_HOST" => self.host.clone(),
                "API_PORT" => self.port.map(|p| p.to_string()),
                _ => None,
            },
            mode,
            false,
        )
    }
}
