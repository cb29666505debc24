//! Session commands consumed by the routing and dashboard surfaces
//!
//! Thin wrappers over the session service that add structured command
//! logging. Errors pass through unmodified so the caller can show the
//! user-facing message (`InvalidCredentials` and `AlreadyRegistered` stay
//! distinguishable from transport failures).

use std::sync::Arc;
use std::time::Instant;

use uninest_domain::{NewAccount, Result, SessionState, UserProfile, UserRole};

use crate::context::AppContext;
use crate::utils::logging::{error_label, log_command_execution};

/// Current user, if any
pub async fn current_user(ctx: &Arc<AppContext>) -> Option<UserProfile> {
    ctx.session.current_user().await
}

/// Full session state snapshot (user + loading flag)
pub async fn session_state(ctx: &Arc<AppContext>) -> SessionState {
    ctx.session.snapshot().await
}

/// Authenticate with email and password
pub async fn sign_in(ctx: &Arc<AppContext>, email: &str, password: &str) -> Result<UserProfile> {
    run_command("session::sign_in", ctx.session.sign_in(email, password)).await
}

/// Register a new account
pub async fn sign_up(ctx: &Arc<AppContext>, account: NewAccount) -> Result<UserProfile> {
    run_command("session::sign_up", ctx.session.sign_up(account)).await
}

/// Begin a federated login with Google
///
/// Returns the authorization URL the caller should redirect to; the
/// redirect target routes back into onboarding.
pub fn sign_in_with_google(ctx: &Arc<AppContext>) -> Result<String> {
    let start = Instant::now();
    let result = ctx.session.sign_in_with_oauth("google");
    log_command_execution("session::sign_in_with_google", start.elapsed(), result.is_ok());
    result
}

/// End the session and clear local user data
pub async fn sign_out(ctx: &Arc<AppContext>) -> Result<()> {
    run_command("session::sign_out", ctx.session.sign_out()).await
}

/// Assign a role to a user (onboarding's pending → terminal transition)
pub async fn update_user_role(
    ctx: &Arc<AppContext>,
    user_id: &str,
    role: UserRole,
) -> Result<UserProfile> {
    run_command("session::update_user_role", ctx.session.update_user_role(user_id, role)).await
}

async fn run_command<T>(
    command: &'static str,
    operation: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    let start = Instant::now();
    let result = operation.await;

    log_command_execution(command, start.elapsed(), result.is_ok());
    if let Err(err) = &result {
        tracing::warn!(command, error_type = error_label(err), "command failed");
    }

    result
}
