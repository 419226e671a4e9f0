//! In-memory profile store.
//!
//! Profiles are kept in their document form and validated on every read, the
//! same way a schemaless document store would be read.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::identity::{Identity, IdentityId};
use crate::profile::{Profile, ProfilePatch, normalize_email};
use crate::role::Role;
use crate::store::ProfileStore;

/// Profile store backed by a map of JSON documents.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    documents: Mutex<BTreeMap<IdentityId, serde_json::Value>>,
}

impl InMemoryProfileStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    pub fn insert(&self, profile: &Profile) {
        self.lock()
            .insert(profile.identity_id().clone(), profile.to_document());
    }

    /// Inserts a raw document, bypassing validation.
    pub fn insert_document(&self, id: IdentityId, document: serde_json::Value) {
        self.lock().insert(id, document);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<IdentityId, serde_json::Value>> {
        self.documents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read(&self, id: &IdentityId) -> Result<Option<Profile>, StoreError> {
        self.lock()
            .get(id)
            .cloned()
            .map(|doc| Profile::from_document(id.clone(), doc))
            .transpose()
    }

    /// Reads every stored profile, skipping documents that fail validation.
    fn read_valid(&self) -> Vec<Profile> {
        let documents: Vec<(IdentityId, serde_json::Value)> = self
            .lock()
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect();
        documents
            .into_iter()
            .filter_map(|(id, doc)| match Profile::from_document(id.clone(), doc) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(identity_id = %id, error = %e, "skipping invalid profile document");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>, StoreError> {
        self.read(id)
    }

    async fn set_profile(&self, id: &IdentityId, patch: ProfilePatch) -> Result<(), StoreError> {
        let mut profile = self
            .read(id)?
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        profile.apply(&patch);
        self.insert(&profile);
        debug!(identity_id = %id, "profile updated");
        Ok(())
    }

    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let key = normalize_email(email);
        Ok(self
            .read_valid()
            .into_iter()
            .find(|profile| profile.email_key() == key))
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let mut profiles = self.read_valid();
        profiles.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.identity_id().cmp(b.identity_id()))
        });
        Ok(profiles)
    }

    async fn provision(
        &self,
        identity: &Identity,
        display_name: Option<String>,
        role: Role,
    ) -> Result<(Profile, bool), StoreError> {
        if let Some(existing) = self.read(identity.id())? {
            return Ok((existing, false));
        }
        let profile = Profile::new(identity, display_name, role);
        self.insert(&profile);
        debug!(identity_id = %identity.id(), role = %role, "profile provisioned");
        Ok((profile, true))
    }
}
