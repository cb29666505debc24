//! Application configuration structures
//!
//! Plain data; loading from the environment or files lives in the infra
//! crate so this crate stays free of I/O.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_REFRESH_THRESHOLD_SECS, DEFAULT_SESSION_STORE_FILE,
};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Identity provider / hosted backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the hosted backend (e.g. "https://abc123.uninest.app")
    pub base_url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Redirect target for federated logins; must route back into the
    /// onboarding entry point so first-time logins create a profile
    pub oauth_redirect_url: String,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: DEFAULT_HTTP_TIMEOUT_SECS }
    }
}

/// Local session mirror configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path of the on-disk session mirror
    pub store_path: String,
    /// Refresh tokens this many seconds before expiry
    pub refresh_threshold_seconds: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: DEFAULT_SESSION_STORE_FILE.to_string(),
            refresh_threshold_seconds: DEFAULT_REFRESH_THRESHOLD_SECS,
        }
    }
}
