//! Client configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/penny/config.toml), or
//!    an explicit path
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! `PENNY_API_URL` and `PENNY_TIMEOUT_SECS` override whichever file was used.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/penny.toml");

pub const API_URL_ENV: &str = "PENNY_API_URL";
pub const TIMEOUT_ENV: &str = "PENNY_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct PennyConfig {
    /// Backend base URL, without trailing slash
    pub api_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for PennyConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl PennyConfig {
    /// Load using the default override location and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from an explicit override path (falls back to defaults if absent)
    pub fn load_from(override_path: Option<&Path>) -> Result<Self> {
        let content = read_config(override_path)?;
        let config = parse_config(&content)?;
        apply_env(config, |key| std::env::var(key).ok())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("penny").join("config.toml"))
}

fn read_config(override_path: Option<&Path>) -> Result<String> {
    let path = match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) if path.exists() => fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        }),
        _ => Ok(DEFAULT_CONFIG.to_string()),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    api: Option<RawApi>,
}

#[derive(Debug, Deserialize)]
struct RawApi {
    url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<PennyConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = PennyConfig::default();

    if let Some(api) = raw.api {
        if let Some(url) = api.url {
            config.api_url = normalize_url(&url)?;
        }
        if let Some(timeout) = api.timeout_secs {
            config.timeout = Duration::from_secs(timeout);
        }
    }

    Ok(config)
}

fn apply_env(
    mut config: PennyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<PennyConfig> {
    if let Some(url) = lookup(API_URL_ENV) {
        config.api_url = normalize_url(&url)?;
    }
    if let Some(raw) = lookup(TIMEOUT_ENV) {
        let secs: u64 = raw.trim().parse().map_err(|_| {
            Error::Config(format!("{} must be whole seconds, got {}", TIMEOUT_ENV, raw))
        })?;
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

fn normalize_url(url: &str) -> Result<String> {
    let url = url.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https://, got {}",
            url
        )));
    }
    Ok(url.to_string())
}
