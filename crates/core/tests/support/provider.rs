//! In-memory mock for the `IdentityProvider` port
//!
//! Deterministic, no network. Events are published through the same
//! broadcast channel shape the real adapter uses, so listener tests
//! exercise the actual subscription path.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uninest_core::IdentityProvider;
use uninest_domain::{
    Identity, Result as DomainResult, Session, SessionEvent, SessionEventKind, UniNestError,
};

/// Configurable in-memory identity provider.
pub struct MockIdentityProvider {
    stored_session: Mutex<Option<Session>>,
    accounts: Mutex<Vec<(String, String, Session)>>,
    events: broadcast::Sender<SessionEvent>,
    fail_get_session: AtomicBool,
    sign_up_calls: AtomicUsize,
    signed_out: AtomicBool,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            stored_session: Mutex::new(None),
            accounts: Mutex::new(Vec::new()),
            events,
            fail_get_session: AtomicBool::new(false),
            sign_up_calls: AtomicUsize::new(0),
            signed_out: AtomicBool::new(false),
        }
    }
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the session returned by `get_session`.
    pub fn with_session(self, session: Session) -> Self {
        *self.stored_session.lock().unwrap() = Some(session);
        self
    }

    /// Register a credential pair that `sign_in_with_password` accepts.
    pub fn with_account(self, email: &str, password: &str, session: Session) -> Self {
        self.accounts.lock().unwrap().push((email.into(), password.into(), session));
        self
    }

    /// Make `get_session` fail with a transport error.
    pub fn failing_get_session(self) -> Self {
        self.fail_get_session.store(true, Ordering::SeqCst);
        self
    }

    /// Publish a raw session event to all subscribers.
    pub fn emit(&self, kind: SessionEventKind, session: Option<Session>) {
        let _ = self.events.send(SessionEvent::new(kind, session));
    }

    pub fn sign_up_calls(&self) -> usize {
        self.sign_up_calls.load(Ordering::SeqCst)
    }

    pub fn was_signed_out(&self) -> bool {
        self.signed_out.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_session(&self) -> DomainResult<Option<Session>> {
        if self.fail_get_session.load(Ordering::SeqCst) {
            return Err(UniNestError::Network("provider unreachable".into()));
        }
        Ok(self.stored_session.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> DomainResult<Session> {
        let accounts = self.accounts.lock().unwrap();
        accounts
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, session)| session.clone())
            .ok_or(UniNestError::InvalidCredentials)
    }

    async fn sign_up(&self, email: &str, _password: &str) -> DomainResult<Identity> {
        let n = self.sign_up_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Identity {
            id: format!("identity-{n}"),
            email: email.into(),
            full_name: None,
            given_name: None,
            family_name: None,
            avatar_url: None,
        })
    }

    fn oauth_authorize_url(&self, provider: &str) -> DomainResult<String> {
        Ok(format!(
            "https://auth.uninest.test/authorize?provider={provider}&redirect_to=%2Fonboarding"
        ))
    }

    async fn sign_out(&self) -> DomainResult<()> {
        self.signed_out.store(true, Ordering::SeqCst);
        *self.stored_session.lock().unwrap() = None;
        self.emit(SessionEventKind::SignedOut, None);
        Ok(())
    }
}
