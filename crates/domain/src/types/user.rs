//! User profile types
//!
//! Application-level user record, keyed by the identity provider's subject
//! id and stored in the hosted backend's `user_profiles` table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::UniNestError;

/// Role attached to a user profile
///
/// `Pending` is the provisional state between authentication and
/// onboarding; the other three are terminal roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Pending,
    Tenant,
    Landlord,
    Agent,
}

impl UserRole {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
            Self::Agent => "agent",
        }
    }

    /// Whether this role has completed onboarding
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UniNestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "tenant" => Ok(Self::Tenant),
            "landlord" => Ok(Self::Landlord),
            "agent" => Ok(Self::Agent),
            other => Err(UniNestError::InvalidInput(format!("unknown role: {other}"))),
        }
    }
}

/// User profile stored in the hosted backend
///
/// `id` equals the identity provider's subject id (1:1, immutable).
/// `default_landlord_id` is present if and only if `role == Agent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub verified: bool,
    pub default_landlord_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Full display name, skipping empty segments
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            (true, false) => self.last_name.clone(),
            (true, true) => self.email.clone(),
        }
    }
}

/// Partial update for a stored profile
///
/// Only the set fields are written; `None` fields are omitted from the
/// persisted patch entirely, so an update never clobbers columns it does
/// not mention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_landlord_id: Option<String>,
}

impl ProfileUpdate {
    /// Patch that only changes the role
    #[must_use]
    pub fn role(role: UserRole) -> Self {
        Self { role: Some(role), ..Self::default() }
    }
}

/// Credential sign-up request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}
