//! Profile resolver
//!
//! Given an authenticated identity, produce the canonical user profile:
//! load the stored row, or create one on first federated login.

use chrono::Utc;
use tracing::{debug, info};
use uninest_domain::{Identity, Result, UniNestError, UserProfile, UserRole};

use super::ports::UserProfileRepository;

/// Resolve the profile for an authenticated identity
///
/// Looks up the stored profile by identity id; when none exists (first
/// login via a federated identity), derives one from provider metadata,
/// inserts it with the provisional role, and returns the persisted row.
///
/// Two near-simultaneous first logins can race on the insert. The losing
/// writer sees `UniNestError::Conflict` and re-reads the winning row, so
/// resolution is idempotent either way.
///
/// # Errors
/// Propagates lookup and insert failures other than the handled conflict.
pub async fn resolve_profile(
    repo: &dyn UserProfileRepository,
    identity: &Identity,
) -> Result<UserProfile> {
    if let Some(profile) = repo.find_by_id(&identity.id).await? {
        debug!(user_id = %profile.id, role = %profile.role, "resolved existing profile");
        return Ok(profile);
    }

    let profile = profile_from_identity(identity);
    match repo.insert(profile).await {
        Ok(inserted) => {
            info!(user_id = %inserted.id, "created profile for first federated login");
            Ok(inserted)
        }
        Err(UniNestError::Conflict(_)) => {
            // Lost the first-login race; the winning row is canonical.
            debug!(user_id = %identity.id, "profile insert conflicted, re-reading");
            repo.find_by_id(&identity.id).await?.ok_or_else(|| {
                UniNestError::Internal(format!(
                    "profile {} missing after insert conflict",
                    identity.id
                ))
            })
        }
        Err(err) => Err(err),
    }
}

/// Build a provisional profile from provider identity metadata
fn profile_from_identity(identity: &Identity) -> UserProfile {
    let (first_name, last_name) = derive_names(identity);

    UserProfile {
        id: identity.id.clone(),
        email: identity.email.clone(),
        role: UserRole::Pending,
        first_name,
        last_name,
        phone_number: None,
        profile_image: identity.avatar_url.clone(),
        verified: false,
        default_landlord_id: None,
        created_at: Utc::now(),
    }
}

/// Split the provider's name metadata into first/last name
///
/// Precedence: whitespace-split `full_name` (first token, then the rest
/// rejoined), then the provider's given/family fields, then empty strings.
fn derive_names(identity: &Identity) -> (String, String) {
    if let Some(full_name) = identity.full_name.as_deref() {
        let mut parts = full_name.split_whitespace();
        if let Some(first) = parts.next() {
            return (first.to_string(), parts.collect::<Vec<_>>().join(" "));
        }
    }

    (
        identity.given_name.clone().unwrap_or_default(),
        identity.family_name.clone().unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(full_name: Option<&str>) -> Identity {
        Identity {
            id: "user-1".into(),
            email: "ada@uninest.app".into(),
            full_name: full_name.map(Into::into),
            given_name: None,
            family_name: None,
            avatar_url: None,
        }
    }

    #[test]
    fn splits_full_name_on_whitespace() {
        let (first, last) = derive_names(&identity(Some("Ada Okafor")));
        assert_eq!(first, "Ada");
        assert_eq!(last, "Okafor");
    }

    #[test]
    fn joins_remaining_tokens_into_last_name() {
        let (first, last) = derive_names(&identity(Some("Ada  Ngozi   Okafor")));
        assert_eq!(first, "Ada");
        assert_eq!(last, "Ngozi Okafor");
    }

    #[test]
    fn single_token_leaves_last_name_empty() {
        let (first, last) = derive_names(&identity(Some("Ada")));
        assert_eq!(first, "Ada");
        assert_eq!(last, "");
    }

    #[test]
    fn falls_back_to_given_and_family_names() {
        let mut id = identity(None);
        id.given_name = Some("Ada".into());
        id.family_name = Some("Okafor".into());
        let (first, last) = derive_names(&id);
        assert_eq!(first, "Ada");
        assert_eq!(last, "Okafor");
    }

    #[test]
    fn blank_full_name_falls_back_too() {
        let mut id = identity(Some("   "));
        id.given_name = Some("Ada".into());
        let (first, last) = derive_names(&id);
        assert_eq!(first, "Ada");
        assert_eq!(last, "");
    }

    #[test]
    fn empty_metadata_yields_empty_names() {
        let (first, last) = derive_names(&identity(None));
        assert_eq!(first, "");
        assert_eq!(last, "");
    }

    #[test]
    fn new_profile_starts_pending_and_unverified() {
        let mut id = identity(Some("Ada Okafor"));
        id.avatar_url = Some("https://cdn.uninest.app/ada.png".into());
        let profile = profile_from_identity(&id);
        assert_eq!(profile.id, "user-1");
        assert_eq!(profile.role, UserRole::Pending);
        assert!(!profile.verified);
        assert_eq!(profile.profile_image.as_deref(), Some("https://cdn.uninest.app/ada.png"));
        assert!(profile.default_landlord_id.is_none());
    }
}
