//! Background token-refresh worker
//!
//! Keeps the mirrored session fresh: sleeps until the access token nears
//! its refresh threshold, refreshes it, and publishes the outcome through
//! the provider's event channel. Lifecycle follows the house rules: the
//! join handle is tracked, cancellation is explicit, and `stop()` waits
//! for the task with a timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::HttpIdentityProvider;

/// Configuration for the session refresher
#[derive(Debug, Clone)]
pub struct SessionRefresherConfig {
    /// Upper bound between wake-ups (also the poll interval while signed out)
    pub poll_interval: Duration,
    /// Lower bound between wake-ups
    pub min_sleep: Duration,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for SessionRefresherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            min_sleep: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Background refresher with explicit lifecycle management
pub struct SessionRefresher {
    provider: Arc<HttpIdentityProvider>,
    config: SessionRefresherConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl SessionRefresher {
    /// Create a new refresher (not yet running)
    pub fn new(provider: Arc<HttpIdentityProvider>, config: SessionRefresherConfig) -> Self {
        Self { provider, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Spawn the refresh loop; a no-op when already running
    pub fn start(&mut self) {
        if self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("session refresher already running");
            return;
        }

        self.cancellation = CancellationToken::new();
        let cancel = self.cancellation.clone();
        let provider = Arc::clone(&self.provider);
        let config = self.config.clone();

        self.task_handle = Some(tokio::spawn(run_loop(provider, config, cancel)));
        info!("session refresher started");
    }

    /// Cancel the loop and wait for it to finish
    pub async fn stop(&mut self) {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => info!("session refresher stopped"),
                Ok(Err(err)) => warn!(error = %err, "session refresher task failed to join"),
                Err(_) => warn!("session refresher did not stop within the join timeout"),
            }
        }
    }

    /// Whether the refresh loop is currently running
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SessionRefresher {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

async fn run_loop(
    provider: Arc<HttpIdentityProvider>,
    config: SessionRefresherConfig,
    cancel: CancellationToken,
) {
    loop {
        let sleep_for = match provider.seconds_until_refresh().await {
            Some(secs) if secs > 0 => {
                Duration::from_secs(secs as u64).clamp(config.min_sleep, config.poll_interval)
            }
            // Due now, or no session to watch: wake at the bounds.
            Some(_) => config.min_sleep,
            None => config.poll_interval,
        };

        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(sleep_for) => {}
        }

        if cancel.is_cancelled() {
            break;
        }

        match provider.refresh_if_needed().await {
            Ok(true) => debug!("access token refreshed in background"),
            Ok(false) => {}
            Err(err) => warn!(error = %err, "background token refresh failed, will retry"),
        }
    }

    debug!("session refresher loop exited");
}
