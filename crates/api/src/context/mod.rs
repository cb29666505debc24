//! Application context - dependency injection container
//!
//! Wires the HTTP adapters to the core session service and owns the
//! background lifecycles (auth-event listener, token refresher).

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uninest_core::{ListenerHandle, SessionService, UserProfileRepository};
use uninest_infra::profiles::ProfileApiConfig;
use uninest_infra::{
    AccessTokenProvider, FileSessionStore, HttpIdentityProvider, HttpUserProfileRepository,
    SessionRefresher, SessionRefresherConfig,
};
use uninest_domain::{Config, Result, UserProfile};

/// Type alias for user profile repository port trait object
type DynUserProfileRepository = dyn UserProfileRepository + 'static;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub provider: Arc<HttpIdentityProvider>,
    pub profiles: Arc<DynUserProfileRepository>,
    pub session: Arc<SessionService>,

    // Background lifecycles, populated by `start`
    listener: Mutex<Option<ListenerHandle>>,
    refresher: Mutex<Option<SessionRefresher>>,
}

impl AppContext {
    /// Create a new application context from the ambient configuration
    ///
    /// # Errors
    /// Returns an error when configuration loading or client construction
    /// fails.
    pub fn new() -> Result<Self> {
        let config = uninest_infra::config::load()?;
        Self::new_with_config(config)
    }

    /// Create a new application context with custom configuration
    ///
    /// This constructor is also what tests use to point the context at a
    /// mock backend and a scratch session store.
    pub fn new_with_config(config: Config) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(config.session.store_path.clone()));
        let provider = Arc::new(HttpIdentityProvider::new(&config, store)?);

        let tokens: Arc<dyn AccessTokenProvider> = provider.clone();
        let profiles: Arc<DynUserProfileRepository> = Arc::new(HttpUserProfileRepository::new(
            ProfileApiConfig::from_config(&config),
            tokens,
        )?);

        let session = Arc::new(SessionService::new(provider.clone(), profiles.clone()));

        Ok(Self {
            config,
            provider,
            profiles,
            session,
            listener: Mutex::new(None),
            refresher: Mutex::new(None),
        })
    }

    /// Start the background lifecycles and restore any existing session
    ///
    /// The listener subscribes before the restore runs so no event emitted
    /// during startup is missed; running both resolution paths for the
    /// same identity is safe because profile resolution is idempotent.
    pub async fn start(&self) -> Option<UserProfile> {
        {
            let mut listener = self.listener.lock().await;
            if listener.is_none() {
                *listener = Some(self.session.start_listener());
            }
        }

        {
            let mut refresher = self.refresher.lock().await;
            let worker = refresher.get_or_insert_with(|| {
                SessionRefresher::new(self.provider.clone(), SessionRefresherConfig::default())
            });
            worker.start();
        }

        let user = self.session.bootstrap().await;
        info!(signed_in = user.is_some(), "application context started");
        user
    }

    /// Stop the background lifecycles
    ///
    /// Idempotent; safe to call when `start` never ran.
    pub async fn shutdown(&self) {
        if let Some(listener) = self.listener.lock().await.take() {
            listener.stop().await;
        }

        if let Some(mut refresher) = self.refresher.lock().await.take() {
            refresher.stop().await;
        }

        info!("application context stopped");
    }
}
