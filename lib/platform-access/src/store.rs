//! The profile store collaborator.
//!
//! This abstraction lets the access gate and the session controller be tested
//! without a database, while the server supplies a PostgreSQL implementation.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::identity::{Identity, IdentityId};
use crate::profile::{Profile, ProfilePatch};
use crate::role::Role;

/// Async key-value access to profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetches the profile of an identity.
    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>, StoreError>;

    /// Applies a partial update to an existing profile.
    async fn set_profile(&self, id: &IdentityId, patch: ProfilePatch) -> Result<(), StoreError>;

    /// Looks a profile up by normalized email address.
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError>;

    /// Lists all profiles, newest first.
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError>;

    /// Creates the profile for an identity unless one already exists.
    ///
    /// Returns the stored profile and whether it was created by this call.
    async fn provision(
        &self,
        identity: &Identity,
        display_name: Option<String>,
        role: Role,
    ) -> Result<(Profile, bool), StoreError>;
}
