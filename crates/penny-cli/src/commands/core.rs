//! Shared utilities for command implementations
//!
//! This module contains:
//! - `open_store` - Open the local store
//! - `load_config` - Resolve client config
//! - `build_client` - API client authenticated with the current token

use std::path::Path;

use anyhow::{Context, Result};
use penny_core::api::TOKEN_ENV;
use penny_core::db::default_db_path;
use penny_core::{store, ApiClient, Database, KeyValueStore, PennyConfig};
use tracing::debug;

/// Open the store at `--db`, or the default data-dir location
pub fn open_store(db_path: Option<&Path>) -> Result<Database> {
    let path = db_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_db_path);
    Database::open(&path).with_context(|| format!("Failed to open store at {}", path.display()))
}

pub fn load_config(config_path: Option<&Path>) -> Result<PennyConfig> {
    let config = PennyConfig::load_from(config_path).context("Failed to load config")?;
    debug!("Using backend {}", config.api_url);
    Ok(config)
}

/// Token from PENNY_TOKEN, else the one saved by `penny login`
pub fn resolve_token(store: &impl KeyValueStore) -> Result<Option<String>> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        let token = token.trim();
        if !token.is_empty() {
            debug!("Using token from {}", TOKEN_ENV);
            return Ok(Some(token.to_string()));
        }
    }
    store::load_token(store).context("Failed to read session token")
}

/// API client for `config`, authenticated when a token is available
pub fn build_client(config: &PennyConfig, store: &impl KeyValueStore) -> Result<ApiClient> {
    let client = ApiClient::from_config(config).context("Failed to build HTTP client")?;
    Ok(match resolve_token(store)? {
        Some(token) => client.with_token(token),
        None => client,
    })
}
