//! In-memory mock for the `UserProfileRepository` port
//!
//! Mirrors the storage contract precisely enough for service tests:
//! inserts conflict on duplicate ids, updates return the stored row, and
//! cache invalidations are counted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use uninest_core::UserProfileRepository;
use uninest_domain::{ProfileUpdate, Result as DomainResult, UniNestError, UserProfile};

/// In-memory mock for `UserProfileRepository`.
#[derive(Default)]
pub struct MockUserProfileRepository {
    rows: Mutex<HashMap<String, UserProfile>>,
    /// Row revealed only when an insert collides with it; simulates a
    /// concurrent first login winning the insert race.
    hidden_winner: Mutex<Option<UserProfile>>,
    insert_calls: AtomicUsize,
    invalidations: AtomicUsize,
    fail_lookups: AtomicBool,
}

impl MockUserProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a stored row.
    pub fn with_profile(self, profile: UserProfile) -> Self {
        self.rows.lock().unwrap().insert(profile.id.clone(), profile);
        self
    }

    /// Arrange for the next insert to lose a simulated race: lookups miss
    /// until the insert conflicts, after which `winner` is the stored row.
    pub fn with_race_winner(self, winner: UserProfile) -> Self {
        *self.hidden_winner.lock().unwrap() = Some(winner);
        self
    }

    /// Make lookups fail with a storage error.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn stored(&self, id: &str) -> Option<UserProfile> {
        self.rows.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl UserProfileRepository for MockUserProfileRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<UserProfile>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(UniNestError::Storage("profile lookup failed".into()));
        }
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<UserProfile>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(UniNestError::Storage("profile lookup failed".into()));
        }
        Ok(self.rows.lock().unwrap().values().find(|p| p.email == email).cloned())
    }

    async fn insert(&self, profile: UserProfile) -> DomainResult<UserProfile> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(winner) = self.hidden_winner.lock().unwrap().take() {
            // The concurrent writer committed first; surface the conflict
            // and make its row visible to the re-read.
            self.rows.lock().unwrap().insert(winner.id.clone(), winner);
            return Err(UniNestError::Conflict("duplicate key: user_profiles.id".into()));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&profile.id) {
            return Err(UniNestError::Conflict("duplicate key: user_profiles.id".into()));
        }
        rows.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    async fn update(&self, id: &str, patch: ProfileUpdate) -> DomainResult<UserProfile> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(id)
            .ok_or_else(|| UniNestError::NotFound(format!("profile {id}")))?;

        if let Some(role) = patch.role {
            row.role = role;
        }
        if let Some(first_name) = patch.first_name {
            row.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            row.last_name = last_name;
        }
        if let Some(phone_number) = patch.phone_number {
            row.phone_number = Some(phone_number);
        }
        if let Some(profile_image) = patch.profile_image {
            row.profile_image = Some(profile_image);
        }
        if let Some(verified) = patch.verified {
            row.verified = verified;
        }
        if let Some(default_landlord_id) = patch.default_landlord_id {
            row.default_landlord_id = Some(default_landlord_id);
        }

        Ok(row.clone())
    }

    async fn invalidate_cache(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
