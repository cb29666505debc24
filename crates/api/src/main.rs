//! UniNest session core - headless service shell
//!
//! Initializes logging and configuration, starts the application
//! context (session restore, auth-event listener, token refresher), and
//! runs until interrupted.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uninest_lib::AppContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env file found, using ambient environment"),
    }

    let ctx = Arc::new(AppContext::new()?);

    match ctx.start().await {
        Some(user) => info!(user_id = %user.id, role = %user.role, "session restored"),
        None => info!("starting signed out"),
    }

    info!("uninest session core running, press ctrl-c to stop");
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }

    ctx.shutdown().await;
    Ok(())
}
