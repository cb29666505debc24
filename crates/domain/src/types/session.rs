//! Session and auth-event types
//!
//! The local mirror of the identity provider's session, plus the typed
//! event vocabulary the auth listener consumes. Provider notifications
//! arrive as [`SessionEvent`]s and are reduced to the two-variant
//! [`AuthEvent`] before touching any state, which keeps the transition
//! table explicit and testable without a live provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::user::UserProfile;

/// Authenticated subject as reported by the identity provider
///
/// Read-only input; this application never mutates provider metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque subject id issued by the provider
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Local mirror of a provider session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub access_token: String,
    /// Optional because some federated flows don't issue one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiration timestamp (UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Check if the access token is expired or will expire within the
    /// given threshold
    ///
    /// Returns `false` when no expiry is set.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let threshold = chrono::Duration::seconds(threshold_seconds);
                Utc::now() + threshold >= expires_at
            }
            None => false,
        }
    }

    /// Get seconds until token expiration, if an expiry is set
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }
}

/// Raw provider notification kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    /// Session discovered during startup restore
    Initial,
}

/// Raw provider notification: a kind plus an optional session payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    pub session: Option<Session>,
}

impl SessionEvent {
    #[must_use]
    pub fn new(kind: SessionEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

/// Reduced auth event consumed by the session listener
///
/// Every provider notification collapses to one of two transitions:
/// either the user is signed out, or a live session exists and local
/// state must be (re)hydrated from it.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedOut,
    SessionEstablished(Session),
}

impl AuthEvent {
    /// Reduce a raw provider notification to an auth transition
    ///
    /// The table:
    /// - `SignedOut` reduces to `SignedOut` even if a stale session payload
    ///   is attached;
    /// - any other kind with a session reduces to `SessionEstablished`;
    /// - any other kind without a session also reduces to `SignedOut` (a
    ///   session-less event means there is nothing left to hydrate from).
    #[must_use]
    pub fn from_session_event(event: SessionEvent) -> Self {
        match (event.kind, event.session) {
            (SessionEventKind::SignedOut, _) => Self::SignedOut,
            (_, Some(session)) => Self::SessionEstablished(session),
            (_, None) => Self::SignedOut,
        }
    }
}

impl From<SessionEvent> for AuthEvent {
    fn from(event: SessionEvent) -> Self {
        Self::from_session_event(event)
    }
}

/// Canonical shared session state
///
/// Single writer (the session service); readers only ever observe a
/// fully-formed profile or explicit absence. State starts as loading so
/// the gate shows a placeholder instead of a sign-in redirect before the
/// first restore completes.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub user: Option<UserProfile>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self { user: None, loading: true }
    }
}
