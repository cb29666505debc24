//! Port interface for the external identity provider
//!
//! This trait defines the boundary between core session logic and the
//! hosted auth backend. Implementations live in the infra crate; tests
//! use in-memory mocks.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uninest_domain::{Identity, Result, Session, SessionEvent};

/// Trait for identity-provider operations
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up an existing session
    ///
    /// Returns `Ok(None)` when no session is stored; transport failures
    /// are errors so the caller decides how to degrade.
    async fn get_session(&self) -> Result<Option<Session>>;

    /// Subscribe to session-change notifications
    ///
    /// Every subscriber receives all events published after the call.
    /// The sender side lives for the provider's lifetime.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Authenticate with email and password
    ///
    /// # Errors
    /// `UniNestError::InvalidCredentials` for rejected credentials,
    /// `UniNestError::Network` for transport failures.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Register a new identity with the provider
    ///
    /// Returns the created identity; profile creation is the caller's
    /// responsibility.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    /// Build the authorization URL for a federated login
    ///
    /// The redirect target is configured to route back into the
    /// onboarding entry point, so first-time federated logins are
    /// funneled through profile creation.
    fn oauth_authorize_url(&self, provider: &str) -> Result<String>;

    /// End the current session with the provider
    async fn sign_out(&self) -> Result<()>;
}
