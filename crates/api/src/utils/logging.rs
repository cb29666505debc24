//! Structured logging helpers for command wrappers

use std::time::Duration;

use tracing::{info, warn};
use uninest_domain::UniNestError;

/// Log the outcome of a command execution with structured fields.
///
/// # Parameters
/// * `command` - Logical command identifier (e.g. `"session::sign_in"`).
/// * `elapsed` - Duration the command execution took.
/// * `success` - Whether the command completed successfully.
///
/// The helper keeps the command wrappers concise and the log shape
/// consistent. Callers must avoid forwarding sensitive values in
/// `command`.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = elapsed.as_millis() as u64;

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `UniNestError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &UniNestError) -> &'static str {
    match error {
        UniNestError::Network(_) => "network",
        UniNestError::Auth(_) => "auth",
        UniNestError::InvalidCredentials => "invalid_credentials",
        UniNestError::AlreadyRegistered(_) => "already_registered",
        UniNestError::Conflict(_) => "conflict",
        UniNestError::Storage(_) => "storage",
        UniNestError::Config(_) => "config",
        UniNestError::NotFound(_) => "not_found",
        UniNestError::InvalidInput(_) => "invalid_input",
        UniNestError::Internal(_) => "internal",
    }
}
