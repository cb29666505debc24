//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `UNINEST_PROVIDER_URL`: Hosted backend base URL
//! - `UNINEST_PROVIDER_API_KEY`: Public API key
//! - `UNINEST_OAUTH_REDIRECT_URL`: Federated-login redirect target
//!   (must route back into the onboarding entry point)
//! - `UNINEST_HTTP_TIMEOUT`: Per-request timeout in seconds (optional)
//! - `UNINEST_SESSION_STORE`: Session mirror file path (optional)
//! - `UNINEST_REFRESH_THRESHOLD`: Seconds before expiry to refresh (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.toml` or `./config.json` (current working directory)
//! 2. `./uninest.toml` or `./uninest.json` (current working directory)
//! 3. `../config.toml` or `../config.json` (parent directory)

use std::path::{Path, PathBuf};

use uninest_domain::{Config, HttpConfig, ProviderConfig, Result, SessionConfig, UniNestError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `UniNestError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Errors
/// Returns `UniNestError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var("UNINEST_PROVIDER_URL")?;
    let api_key = env_var("UNINEST_PROVIDER_API_KEY")?;
    let oauth_redirect_url = env_var("UNINEST_OAUTH_REDIRECT_URL")?;

    let mut http = HttpConfig::default();
    if let Ok(value) = std::env::var("UNINEST_HTTP_TIMEOUT") {
        http.timeout_seconds = value.parse::<u64>().map_err(|e| {
            UniNestError::Config(format!("invalid UNINEST_HTTP_TIMEOUT: {e}"))
        })?;
    }

    let mut session = SessionConfig::default();
    if let Ok(value) = std::env::var("UNINEST_SESSION_STORE") {
        session.store_path = value;
    }
    if let Ok(value) = std::env::var("UNINEST_REFRESH_THRESHOLD") {
        session.refresh_threshold_seconds = value.parse::<i64>().map_err(|e| {
            UniNestError::Config(format!("invalid UNINEST_REFRESH_THRESHOLD: {e}"))
        })?;
    }

    Ok(Config {
        provider: ProviderConfig { base_url, api_key, oauth_redirect_url },
        http,
        session,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `UniNestError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File contents fail to parse
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_config_paths().ok_or_else(|| {
            UniNestError::Config("no config file found in probed locations".to_string())
        })?,
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        UniNestError::Config(format!("failed to read config file {}: {e}", path.display()))
    })?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str::<Config>(&contents).map_err(|e| {
            UniNestError::Config(format!("invalid TOML in {}: {e}", path.display()))
        })?,
        Some("json") => serde_json::from_str::<Config>(&contents).map_err(|e| {
            UniNestError::Config(format!("invalid JSON in {}: {e}", path.display()))
        })?,
        other => {
            return Err(UniNestError::Config(format!(
                "unsupported config extension {other:?} for {}",
                path.display()
            )))
        }
    };

    validate(&config)?;
    tracing::info!(path = %path.display(), "configuration loaded from file");
    Ok(config)
}

/// Probe the default config file locations, returning the first that exists
fn probe_config_paths() -> Option<PathBuf> {
    let candidates = [
        "config.toml",
        "config.json",
        "uninest.toml",
        "uninest.json",
        "../config.toml",
        "../config.json",
    ];

    candidates.iter().map(PathBuf::from).find(|path| path.is_file())
}

/// Reject configs that parse but cannot work
fn validate(config: &Config) -> Result<()> {
    if config.provider.base_url.is_empty() {
        return Err(UniNestError::Config("provider.base_url must not be empty".to_string()));
    }
    if config.provider.api_key.is_empty() {
        return Err(UniNestError::Config("provider.api_key must not be empty".to_string()));
    }
    if config.provider.oauth_redirect_url.is_empty() {
        return Err(UniNestError::Config(
            "provider.oauth_redirect_url must not be empty".to_string(),
        ));
    }
    if config.http.timeout_seconds == 0 {
        return Err(UniNestError::Config("http.timeout_seconds must be positive".to_string()));
    }
    Ok(())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| UniNestError::Config(format!("missing environment variable {name}")))
}
