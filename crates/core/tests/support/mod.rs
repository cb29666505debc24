//! Shared test support for core service tests

pub mod provider;
pub mod repositories;

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use uninest_domain::{Identity, Session, UserProfile, UserRole};

/// Poll an async predicate until it holds or a 2s deadline passes.
///
/// Returns `true` when the predicate became true within the deadline.
pub async fn wait_until<F, Fut>(mut predicate: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if predicate().await {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Identity fixture with a full name and avatar, as a federated provider
/// would report it.
pub fn federated_identity(id: &str, email: &str, full_name: &str) -> Identity {
    Identity {
        id: id.into(),
        email: email.into(),
        full_name: Some(full_name.into()),
        given_name: None,
        family_name: None,
        avatar_url: Some(format!("https://cdn.uninest.app/avatars/{id}.png")),
    }
}

/// Session fixture wrapping the given identity.
pub fn session_for(identity: Identity) -> Session {
    Session {
        identity,
        access_token: "access-token".into(),
        refresh_token: Some("refresh-token".into()),
        expires_at: Some(Utc::now() + chrono::Duration::seconds(3600)),
    }
}

/// Stored profile fixture with the given role.
pub fn profile_with_role(id: &str, email: &str, role: UserRole) -> UserProfile {
    UserProfile {
        id: id.into(),
        email: email.into(),
        role,
        first_name: "Ada".into(),
        last_name: "Okafor".into(),
        phone_number: None,
        profile_image: None,
        verified: false,
        default_landlord_id: None,
        created_at: Utc::now(),
    }
}
