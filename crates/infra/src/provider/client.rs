//! HTTP identity-provider client
//!
//! Talks to the hosted auth backend's REST API: password grant, signup,
//! refresh grant, logout, and authorize-URL construction for federated
//! logins. Mirrors the active session in memory and through the
//! [`SessionStore`], and publishes [`SessionEvent`]s over a broadcast
//! channel for the core listener.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};
use uninest_core::IdentityProvider;
use uninest_domain::{
    Config, Identity, Result, Session, SessionEvent, SessionEventKind, UniNestError,
};

use super::session_store::SessionStore;
use super::types::{AuthApiErrorBody, ProviderUser, TokenResponse};
use super::AccessTokenProvider;

/// Capacity of the session-event fan-out channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// HTTP client for the hosted identity provider
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    oauth_redirect_url: String,
    refresh_threshold_seconds: i64,
    store: Arc<dyn SessionStore>,
    current: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpIdentityProvider {
    /// Create a new provider client
    ///
    /// # Errors
    /// Returns `UniNestError::Config` if the HTTP client cannot be built.
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .build()
            .map_err(|err| UniNestError::Config(format!("failed to build HTTP client: {err}")))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            http,
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_key: config.provider.api_key.clone(),
            oauth_redirect_url: config.provider.oauth_redirect_url.clone(),
            refresh_threshold_seconds: config.session.refresh_threshold_seconds,
            store,
            current: RwLock::new(None),
            events,
        })
    }

    fn auth_endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{path}", self.base_url)
    }

    /// Execute a token-endpoint request for the given grant type
    async fn token_request(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let url = format!("{}?grant_type={grant_type}", self.auth_endpoint("/token"));

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| UniNestError::Auth(format!("malformed token response: {err}")))?;

        Ok(token.into_session())
    }

    /// Persist, cache, and announce a freshly issued session
    async fn install_session(&self, session: Session, kind: SessionEventKind) -> Result<Session> {
        self.store.save(&session).await?;
        *self.current.write().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::new(kind, Some(session.clone())));
        Ok(session)
    }

    /// Drop the local session mirror and announce the sign-out
    async fn invalidate_local_session(&self) {
        *self.current.write().await = None;
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session mirror");
        }
        let _ = self.events.send(SessionEvent::new(SessionEventKind::SignedOut, None));
    }

    /// Refresh the current access token when it is within the threshold
    ///
    /// Returns `Ok(true)` when a refresh happened. A revoked refresh token
    /// is a detected invalidation: the local session is dropped, a
    /// signed-out event is published, and `Ok(false)` is returned.
    /// Transport failures propagate so the caller can retry later.
    pub async fn refresh_if_needed(&self) -> Result<bool> {
        let session = self.current.read().await.clone();
        let Some(session) = session else {
            return Ok(false);
        };

        if !session.is_expired(self.refresh_threshold_seconds) {
            return Ok(false);
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            if session.is_expired(0) {
                debug!("session expired without a refresh token");
                self.invalidate_local_session().await;
            }
            return Ok(false);
        };

        match self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(renewed) => {
                self.install_session(renewed, SessionEventKind::TokenRefreshed).await?;
                debug!("access token refreshed");
                Ok(true)
            }
            Err(UniNestError::InvalidCredentials) | Err(UniNestError::Auth(_)) => {
                info!("refresh token no longer accepted, signing out locally");
                self.invalidate_local_session().await;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Seconds until the current session crosses the refresh threshold
    ///
    /// `None` when there is no session or the session has no expiry.
    pub async fn seconds_until_refresh(&self) -> Option<i64> {
        let session = self.current.read().await.clone()?;
        Some(session.seconds_until_expiry()? - self.refresh_threshold_seconds)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>> {
        let candidate = match self.current.read().await.clone() {
            Some(session) => Some(session),
            None => self.store.load().await?,
        };

        let Some(session) = candidate else {
            return Ok(None);
        };

        if !session.is_expired(self.refresh_threshold_seconds) {
            *self.current.write().await = Some(session.clone());
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            debug!("stored session expired without a refresh token");
            self.invalidate_local_session().await;
            return Ok(None);
        };

        match self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(renewed) => {
                let renewed = self.install_session(renewed, SessionEventKind::Initial).await?;
                Ok(Some(renewed))
            }
            Err(UniNestError::InvalidCredentials) | Err(UniNestError::Auth(_)) => {
                info!("stored session no longer accepted by the provider");
                self.invalidate_local_session().await;
                Ok(None)
            }
            // Transport failures surface to the caller, which decides how
            // to degrade (the bootstrapper logs and continues signed out).
            Err(err) => Err(err),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;
        let session = self.install_session(session, SessionEventKind::SignedIn).await?;
        info!(user_id = %session.identity.id, "password sign-in succeeded");
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let url = self.auth_endpoint("/signup");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(auth_error(status, &body));
        }

        // The backend answers with a session envelope when the account is
        // active immediately, and with the bare user object when it is not
        // (e.g. confirmation pending).
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|err| UniNestError::Auth(format!("malformed signup response: {err}")))?;

        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)
                .map_err(|err| UniNestError::Auth(format!("malformed signup session: {err}")))?;
            let session =
                self.install_session(token.into_session(), SessionEventKind::SignedIn).await?;
            info!(user_id = %session.identity.id, "signup created an active session");
            return Ok(session.identity);
        }

        let user_value = match value.get("user") {
            Some(user) if !user.is_null() => user.clone(),
            _ => value,
        };
        let user: ProviderUser = serde_json::from_value(user_value)
            .map_err(|err| UniNestError::Auth(format!("malformed signup user: {err}")))?;

        info!(user_id = %user.id, "identity registered");
        Ok(user.into_identity())
    }

    fn oauth_authorize_url(&self, provider: &str) -> Result<String> {
        if provider.is_empty() {
            return Err(UniNestError::InvalidInput("oauth provider must not be empty".into()));
        }

        Ok(format!(
            "{}?provider={}&redirect_to={}",
            self.auth_endpoint("/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(&self.oauth_redirect_url)
        ))
    }

    async fn sign_out(&self) -> Result<()> {
        let session = self.current.write().await.take();

        // Local state goes first: even if revocation fails, a later
        // sign-in by another identity must not see this session.
        if let Err(err) = self.store.clear().await {
            warn!(error = %err, "failed to clear session mirror during sign-out");
        }
        let _ = self.events.send(SessionEvent::new(SessionEventKind::SignedOut, None));

        let Some(session) = session else {
            return Ok(());
        };

        let response = self
            .http
            .post(self.auth_endpoint("/logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND
        {
            info!("session revoked with the provider");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(auth_error(status, &body))
        }
    }
}

#[async_trait]
impl AccessTokenProvider for HttpIdentityProvider {
    async fn access_token(&self) -> Result<String> {
        match self.current.read().await.as_ref() {
            Some(session) => Ok(session.access_token.clone()),
            // Anonymous requests authenticate with the public API key.
            None => Ok(self.api_key.clone()),
        }
    }
}

/// Map a reqwest failure to the transport error variant
fn map_transport_error(err: reqwest::Error) -> UniNestError {
    UniNestError::Network(err.to_string())
}

/// Map a non-success auth response to the right error variant
///
/// Rejected credentials become `InvalidCredentials`; provider outages
/// (5xx) are transport errors; everything else is an auth failure with
/// the provider's message attached.
fn auth_error(status: StatusCode, body: &str) -> UniNestError {
    let parsed = AuthApiErrorBody::parse(body);

    if parsed.is_invalid_credentials() {
        return UniNestError::InvalidCredentials;
    }

    if status.is_server_error() {
        return UniNestError::Network(format!("provider error {status}: {}", parsed.message()));
    }

    UniNestError::Auth(parsed.message())
}
