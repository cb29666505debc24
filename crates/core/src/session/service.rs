//! Session service - canonical session state and the auth operations
//!
//! Owns the single shared `SessionState` cell. The bootstrapper, the
//! auth-event listener, and the role mutator all write through this
//! service, so readers only ever observe fully-formed profiles or
//! explicit absence.
//!
//! Error policy: the bootstrap and listener paths are lifecycle-managed
//! background work and never let an error escape (they log and degrade to
//! the signed-out state); the user-initiated operations (`sign_in`,
//! `sign_up`, `sign_out`, `update_user_role`) propagate errors so the
//! calling surface can react.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uninest_domain::{
    AuthEvent, NewAccount, ProfileUpdate, Result, SessionState, UniNestError, UserProfile, UserRole,
};
use uuid::Uuid;

use super::ports::IdentityProvider;
use crate::user::ports::UserProfileRepository;
use crate::user::resolver::resolve_profile;

/// Session service holding the canonical user state
///
/// Cloning is cheap and shares the same state cell; every clone writes
/// through the same canonical `SessionState`.
#[derive(Clone)]
pub struct SessionService {
    provider: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn UserProfileRepository>,
    state: Arc<RwLock<SessionState>>,
}

impl SessionService {
    /// Create a new session service
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn UserProfileRepository>,
    ) -> Self {
        Self { provider, profiles, state: Arc::new(RwLock::new(SessionState::default())) }
    }

    /// Current user, if any
    pub async fn current_user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    /// Whether session restore is still in flight
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Snapshot of the full session state
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Restore an existing session on application start
    ///
    /// Queries the provider for a stored session and hydrates the user
    /// state from it. Any failure along the way is logged and collapses to
    /// the signed-out state; this method never returns an error. The
    /// `loading` flag is raised for the duration of the check and lowered
    /// in every path.
    pub async fn bootstrap(&self) -> Option<UserProfile> {
        self.state.write().await.loading = true;

        let user = match self.provider.get_session().await {
            Ok(Some(session)) => {
                match resolve_profile(self.profiles.as_ref(), &session.identity).await {
                    Ok(profile) => Some(profile),
                    Err(err) => {
                        warn!(error = %err, "profile resolution failed during session restore");
                        None
                    }
                }
            }
            Ok(None) => {
                debug!("no existing session to restore");
                None
            }
            Err(err) => {
                warn!(error = %err, "session restore failed, continuing signed out");
                None
            }
        };

        {
            let mut state = self.state.write().await;
            state.user = user.clone();
            state.loading = false;
        }

        if let Some(profile) = &user {
            info!(user_id = %profile.id, role = %profile.role, "session restored");
        }

        user
    }

    /// Subscribe to provider session events for the service's lifetime
    ///
    /// The returned handle owns the subscription: `stop()` cancels and
    /// joins the task exactly once, and dropping the handle cancels it,
    /// so the listener cannot leak past its owner.
    pub fn start_listener(&self) -> ListenerHandle {
        let mut events = self.provider.subscribe();
        let cancellation = CancellationToken::new();
        let cancel = cancellation.clone();
        let service = self.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("auth listener cancelled");
                        break;
                    }
                    event = events.recv() => match event {
                        Ok(event) => {
                            service.apply_auth_event(AuthEvent::from_session_event(event)).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Dropped events mean our view may be stale;
                            // resync from the provider instead of guessing.
                            warn!(skipped, "auth listener lagged, resyncing");
                            service.resync_from_provider().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("auth event channel closed");
                            break;
                        }
                    }
                }
            }
        });

        ListenerHandle { cancellation, task: Some(task) }
    }

    /// Authenticate with email and password
    ///
    /// # Errors
    /// `InvalidCredentials` for rejected credentials, `Network` for
    /// transport failures, plus any profile-resolution failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        let profile = resolve_profile(self.profiles.as_ref(), &session.identity).await?;
        self.replace_user(Some(profile.clone())).await;
        info!(user_id = %profile.id, "signed in");
        Ok(profile)
    }

    /// Register a new account and create its profile
    ///
    /// Checks for an existing profile by email *before* creating the
    /// provider identity, so a duplicate registration fails fast instead
    /// of leaving an orphaned identity without a profile.
    ///
    /// # Errors
    /// `AlreadyRegistered` when the email already has a profile; provider
    /// and storage failures propagate unmodified.
    pub async fn sign_up(&self, account: NewAccount) -> Result<UserProfile> {
        if self.profiles.find_by_email(&account.email).await?.is_some() {
            return Err(UniNestError::AlreadyRegistered(account.email));
        }

        let identity = self.provider.sign_up(&account.email, &account.password).await?;

        let profile = UserProfile {
            id: identity.id,
            // The provider's copy is authoritative for the stored email.
            email: identity.email,
            role: UserRole::Pending,
            first_name: account.first_name,
            last_name: account.last_name,
            phone_number: account.phone_number,
            profile_image: None,
            verified: false,
            default_landlord_id: None,
            created_at: chrono::Utc::now(),
        };

        let inserted = self.profiles.insert(profile).await?;
        self.replace_user(Some(inserted.clone())).await;
        info!(user_id = %inserted.id, "account created");
        Ok(inserted)
    }

    /// Build the authorization URL for a federated login
    ///
    /// The redirect target routes back into the onboarding entry point so
    /// first-time federated logins create their profile there.
    pub fn sign_in_with_oauth(&self, provider: &str) -> Result<String> {
        self.provider.oauth_authorize_url(provider)
    }

    /// End the session and clear all locally held user data
    ///
    /// Cached reads are dropped before the user cell so a subsequent
    /// sign-in by a different identity cannot observe stale rows. Local
    /// state is cleared even when the provider call fails; the provider
    /// error still propagates so the caller can surface it.
    pub async fn sign_out(&self) -> Result<()> {
        self.profiles.invalidate_cache().await;
        let result = self.provider.sign_out().await;
        self.replace_user(None).await;
        info!("signed out");
        result
    }

    /// Move a user onto a new role
    ///
    /// Normally called once during onboarding (pending → terminal), but the
    /// previous role is intentionally not re-validated: the routing gate is
    /// what funnels ordinary users through onboarding exactly once, and
    /// administrative role changes stay possible. Assigning the agent role
    /// generates a fresh delegation id in the same update; other roles
    /// leave the stored delegation id untouched.
    ///
    /// # Errors
    /// Persistence failures propagate unmodified so the caller can keep
    /// the user on the onboarding screen instead of silently stranding
    /// them.
    pub async fn update_user_role(&self, user_id: &str, role: UserRole) -> Result<UserProfile> {
        let mut patch = ProfileUpdate::role(role);
        if role == UserRole::Agent {
            patch.default_landlord_id = Some(Uuid::new_v4().to_string());
        }

        let updated = self.profiles.update(user_id, patch).await?;
        info!(user_id = %updated.id, role = %updated.role, "role assigned");

        // Only publish if this is (or replaces) the current user; an
        // administrative change to somebody else must not hijack the cell.
        let mut state = self.state.write().await;
        let is_current = state.user.as_ref().map_or(true, |current| current.id == updated.id);
        if is_current {
            state.user = Some(updated.clone());
        }
        drop(state);

        Ok(updated)
    }

    /// Apply a reduced auth event to the canonical state
    ///
    /// Resolution failures clear the state instead of propagating; this
    /// runs detached from any request/response cycle.
    async fn apply_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedOut => {
                debug!("auth event: signed out");
                self.replace_user(None).await;
            }
            AuthEvent::SessionEstablished(session) => {
                match resolve_profile(self.profiles.as_ref(), &session.identity).await {
                    Ok(profile) => {
                        debug!(user_id = %profile.id, "auth event: session established");
                        self.replace_user(Some(profile)).await;
                    }
                    Err(err) => {
                        warn!(error = %err, "profile resolution failed for auth event");
                        self.replace_user(None).await;
                    }
                }
            }
        }
    }

    /// Re-hydrate state straight from the provider after dropped events
    async fn resync_from_provider(&self) {
        match self.provider.get_session().await {
            Ok(Some(session)) => {
                self.apply_auth_event(AuthEvent::SessionEstablished(session)).await;
            }
            Ok(None) => self.apply_auth_event(AuthEvent::SignedOut).await,
            Err(err) => warn!(error = %err, "resync after listener lag failed"),
        }
    }

    async fn replace_user(&self, user: Option<UserProfile>) {
        self.state.write().await.user = user;
    }
}

/// Handle owning the auth-event listener subscription
///
/// Cancellation is idempotent: `stop()` consumes the handle, and `Drop`
/// cancels the task if `stop()` was never called.
pub struct ListenerHandle {
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Cancel the listener and wait for it to finish
    pub async fn stop(mut self) {
        self.cancellation.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "auth listener task failed to join");
            }
        }
    }

    /// Whether the listener task has already exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
