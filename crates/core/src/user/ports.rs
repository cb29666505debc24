//! Port interface for user profile persistence
//!
//! This trait defines the boundary between core business logic and the
//! profile storage backend.

use async_trait::async_trait;
use uninest_domain::{ProfileUpdate, Result, UserProfile};

/// Trait for user profile persistence and retrieval
#[async_trait]
pub trait UserProfileRepository: Send + Sync {
    /// Get user profile by identity id
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>>;

    /// Get user profile by email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    /// Create a new user profile, returning the persisted row
    ///
    /// # Errors
    /// `UniNestError::Conflict` when a row with the same id already
    /// exists, so callers can resolve the first-login insert race.
    async fn insert(&self, profile: UserProfile) -> Result<UserProfile>;

    /// Apply a partial update, returning the updated row
    ///
    /// # Errors
    /// `UniNestError::NotFound` when no row matches `id`.
    async fn update(&self, id: &str, patch: ProfileUpdate) -> Result<UserProfile>;

    /// Drop every cached read owned by this repository
    ///
    /// Called on sign-out so a later sign-in by a different identity
    /// cannot observe the previous user's rows.
    async fn invalidate_cache(&self);
}
