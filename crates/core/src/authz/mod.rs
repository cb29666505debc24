//! Route authorization gate
//!
//! A pure decision function: given the canonical session state and a
//! route's declared role requirement, decide whether the route renders or
//! where the user is redirected. No I/O, no side effects; the routing
//! layer applies the decision.

use uninest_domain::constants::{ONBOARDING_ROUTE, ROOT_ROUTE, SIGN_IN_ROUTE};
use uninest_domain::{UserProfile, UserRole};

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Session state is still being restored; render a neutral placeholder
    Loading,
    /// The route may render
    Render,
    /// Send the user to the given route instead
    Redirect(&'static str),
}

/// Decide whether a route may render for the current session state
///
/// Decision order:
/// 1. while loading, always `Loading` (never a redirect);
/// 2. no user means sign-in;
/// 3. a pending user is sent to onboarding no matter what the route
///    requires;
/// 4. a route without a requirement renders;
/// 5. landlord/agent requirements accept either role; agents act as
///    delegates for landlords and must reach the same screens;
/// 6. anything else is an exact match, with the application root as the
///    fallback target.
#[must_use]
pub fn authorize(
    user: Option<&UserProfile>,
    loading: bool,
    required: Option<UserRole>,
) -> AccessDecision {
    if loading {
        return AccessDecision::Loading;
    }

    let Some(user) = user else {
        return AccessDecision::Redirect(SIGN_IN_ROUTE);
    };

    if user.role == UserRole::Pending {
        return AccessDecision::Redirect(ONBOARDING_ROUTE);
    }

    let Some(required) = required else {
        return AccessDecision::Render;
    };

    match required {
        UserRole::Landlord | UserRole::Agent => {
            if matches!(user.role, UserRole::Landlord | UserRole::Agent) {
                AccessDecision::Render
            } else {
                AccessDecision::Redirect(ROOT_ROUTE)
            }
        }
        _ => {
            if user.role == required {
                AccessDecision::Render
            } else {
                AccessDecision::Redirect(ROOT_ROUTE)
            }
        }
    }
}
