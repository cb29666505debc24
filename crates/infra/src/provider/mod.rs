//! Identity-provider adapter
//!
//! HTTP client for the hosted auth backend, the on-disk session mirror,
//! and the background token-refresh worker.

pub mod client;
pub mod refresh;
pub mod session_store;
pub mod types;

use async_trait::async_trait;
use uninest_domain::Result;

pub use client::HttpIdentityProvider;
pub use refresh::{SessionRefresher, SessionRefresherConfig};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};

/// Trait for providing bearer tokens to downstream REST clients
///
/// Implementations hand out the signed-in user's access token when a
/// session exists and fall back to the public API key otherwise.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get a token suitable for the `Authorization` header
    async fn access_token(&self) -> Result<String>;
}

/// Token provider that always returns a fixed token
///
/// Used in tests and for anonymous-only clients.
pub struct StaticAccessTokenProvider {
    token: String,
}

impl StaticAccessTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticAccessTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}
