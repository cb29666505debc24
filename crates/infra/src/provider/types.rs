//! Wire types for the hosted auth REST API
//!
//! Standard token-endpoint response shapes plus the provider's user
//! object. These mirror what the backend actually sends; mapping into
//! domain types happens here so the client stays thin.

use chrono::Utc;
use serde::Deserialize;
use uninest_domain::{Identity, Session};

/// Token endpoint response (password grant and refresh grant)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
    pub user: ProviderUser,
}

impl TokenResponse {
    /// Convert into the domain session mirror, stamping the absolute
    /// expiry from `expires_in`.
    pub fn into_session(self) -> Session {
        let expires_at =
            (self.expires_in > 0).then(|| Utc::now() + chrono::Duration::seconds(self.expires_in));

        Session {
            identity: self.user.into_identity(),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
        }
    }
}

/// User object as the provider reports it
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub user_metadata: ProviderUserMetadata,
}

impl ProviderUser {
    pub fn into_identity(self) -> Identity {
        let meta = self.user_metadata;
        Identity {
            id: self.id,
            email: self.email,
            full_name: meta.full_name,
            given_name: meta.given_name,
            family_name: meta.family_name,
            avatar_url: meta.avatar_url.or(meta.picture),
        }
    }
}

/// Free-form metadata federated providers attach to the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderUserMetadata {
    #[serde(default, alias = "name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Error body returned by the auth endpoints
///
/// The backend is inconsistent between `{error, error_description}` and
/// `{code, msg, error_code}` shapes; all fields are optional and
/// [`AuthApiErrorBody::message`] picks whichever is present.
#[derive(Debug, Default, Deserialize)]
pub struct AuthApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl AuthApiErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Best human-readable message the body offers
    pub fn message(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "authentication request rejected".to_string())
    }

    /// Whether the body describes rejected credentials (as opposed to a
    /// transport or server problem)
    pub fn is_invalid_credentials(&self) -> bool {
        if self.error_code.as_deref() == Some("invalid_credentials") {
            return true;
        }
        if self.error.as_deref() == Some("invalid_grant") {
            return true;
        }
        self.message().to_lowercase().contains("invalid login credentials")
    }
}
