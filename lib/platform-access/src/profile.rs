//! Profile records: the persisted authorization state of an identity.
//!
//! A profile is keyed by `IdentityId` and created at registration time with
//! `authorized = false`. Only an admin authorize/revoke action changes the
//! authorization flag afterwards.
//!
//! Stores that hold loosely-typed documents must go through
//! [`Profile::from_document`], which fails closed: a document with a missing
//! or unknown field is rejected instead of being read with defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::identity::{Identity, IdentityId};
use crate::role::Role;

/// Normalizes an email address for use as a lookup key.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Persisted authorization and role record for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    identity_id: IdentityId,
    display_name: Option<String>,
    email_address: String,
    authorized: bool,
    role: Role,
    created_at: DateTime<Utc>,
}

impl Profile {
    /// Creates the profile for a newly registered identity.
    ///
    /// New profiles are never authorized.
    #[must_use]
    pub fn new(identity: &Identity, display_name: Option<String>, role: Role) -> Self {
        Self {
            identity_id: identity.id().clone(),
            display_name: display_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            email_address: identity.email_address().trim().to_string(),
            authorized: false,
            role,
            created_at: Utc::now(),
        }
    }

    /// Creates a profile with all fields specified.
    ///
    /// Use this when reconstituting a profile from typed storage.
    #[must_use]
    pub fn with_all_fields(
        identity_id: IdentityId,
        display_name: Option<String>,
        email_address: String,
        authorized: bool,
        role: Role,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity_id,
            display_name,
            email_address,
            authorized,
            role,
            created_at,
        }
    }

    /// Returns the identity this profile belongs to.
    #[must_use]
    pub fn identity_id(&self) -> &IdentityId {
        &self.identity_id
    }

    /// Returns the display name, if one was given at registration.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Returns the name to show in the UI: display name, else email.
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name().unwrap_or(&self.email_address)
    }

    /// Returns the email address.
    #[must_use]
    pub fn email_address(&self) -> &str {
        &self.email_address
    }

    /// Returns the normalized email used for legacy lookups.
    #[must_use]
    pub fn email_key(&self) -> String {
        normalize_email(&self.email_address)
    }

    /// Returns whether an admin has authorized this profile.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorized
    }

    /// Returns the profile's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns true if the profile may watch lessons.
    ///
    /// Admins always may; their `authorized` flag is irrelevant.
    #[must_use]
    pub fn may_watch(&self) -> bool {
        self.authorized || self.role.is_admin()
    }

    /// Returns when the profile was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(authorized) = patch.authorized {
            self.authorized = authorized;
        }
        if let Some(display_name) = &patch.display_name {
            self.display_name = display_name.clone();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }

    /// Validates a loosely-typed stored document into a profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRecord` if the document has unknown
    /// fields, lacks a required field, or carries an unrecognized role.
    pub fn from_document(
        identity_id: IdentityId,
        document: serde_json::Value,
    ) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            id: identity_id.to_string(),
            reason,
        };

        let doc: ProfileDocument =
            serde_json::from_value(document).map_err(|e| invalid(e.to_string()))?;

        let email_address = doc
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| invalid("missing field `email`".to_string()))?;
        let authorized = doc
            .authorized
            .ok_or_else(|| invalid("missing field `authorized`".to_string()))?;
        let role = doc
            .role
            .ok_or_else(|| invalid("missing field `role`".to_string()))?
            .parse::<Role>()
            .map_err(|e| invalid(e.to_string()))?;
        let created_at = doc
            .created_at
            .ok_or_else(|| invalid("missing field `created_at`".to_string()))?;

        Ok(Self {
            identity_id,
            display_name: doc.name,
            email_address,
            authorized,
            role,
            created_at,
        })
    }

    /// Converts the profile into its stored document form.
    #[must_use]
    pub fn to_document(&self) -> serde_json::Value {
        let doc = ProfileDocument {
            email: Some(self.email_address.clone()),
            email_lower: Some(self.email_key()),
            name: self.display_name.clone(),
            authorized: Some(self.authorized),
            role: Some(self.role.as_str().to_string()),
            created_at: Some(self.created_at),
        };
        serde_json::to_value(doc).unwrap_or(serde_json::Value::Null)
    }
}

/// Partial update of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    /// New authorization flag.
    pub authorized: Option<bool>,
    /// New display name (`Some(None)` clears it).
    pub display_name: Option<Option<String>>,
    /// New role.
    pub role: Option<Role>,
}

impl ProfilePatch {
    /// A patch that only sets the authorization flag.
    #[must_use]
    pub fn authorized(authorized: bool) -> Self {
        Self {
            authorized: Some(authorized),
            ..Self::default()
        }
    }
}

/// Wire shape of a profile in a document store.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileDocument {
    email: Option<String>,
    #[serde(default)]
    email_lower: Option<String>,
    #[serde(default)]
    name: Option<String>,
    authorized: Option<bool>,
    role: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Identity {
        Identity::new("uid-1", "Ana@Example.com ")
    }

    #[test]
    fn new_profile_is_not_authorized() {
        let profile = Profile::new(&identity(), Some("Ana".to_string()), Role::User);
        assert!(!profile.is_authorized());
        assert!(!profile.may_watch());
        assert_eq!(profile.role(), Role::User);
        assert_eq!(profile.identity_id().as_str(), "uid-1");
    }

    #[test]
    fn new_profile_trims_inputs() {
        let profile = Profile::new(&identity(), Some("  ".to_string()), Role::User);
        assert_eq!(profile.display_name(), None);
        assert_eq!(profile.email_address(), "Ana@Example.com");
        assert_eq!(profile.email_key(), "ana@example.com");
        assert_eq!(profile.label(), "Ana@Example.com");
    }

    #[test]
    fn admin_may_watch_without_authorization() {
        let profile = Profile::new(&identity(), None, Role::Admin);
        assert!(!profile.is_authorized());
        assert!(profile.may_watch());
    }

    #[test]
    fn apply_patch_updates_only_given_fields() {
        let mut profile = Profile::new(&identity(), Some("Ana".to_string()), Role::User);
        profile.apply(&ProfilePatch::authorized(true));
        assert!(profile.is_authorized());
        assert_eq!(profile.display_name(), Some("Ana"));

        profile.apply(&ProfilePatch {
            display_name: Some(None),
            ..ProfilePatch::default()
        });
        assert_eq!(profile.display_name(), None);
        assert!(profile.is_authorized());
    }

    #[test]
    fn document_roundtrip() {
        let profile = Profile::new(&identity(), Some("Ana".to_string()), Role::Admin);
        let doc = profile.to_document();
        assert_eq!(doc["email_lower"], "ana@example.com");
        let parsed = Profile::from_document(IdentityId::new("uid-1"), doc).expect("valid");
        assert_eq!(parsed, profile);
    }

    #[test]
    fn document_with_unknown_field_fails_closed() {
        let doc = json!({
            "email": "a@example.com",
            "authorized": true,
            "role": "user",
            "created_at": "2024-01-01T00:00:00Z",
            "superuser": true
        });
        let err = Profile::from_document(IdentityId::new("uid-1"), doc).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRecord { .. }));
    }

    #[test]
    fn document_missing_authorized_fails_closed() {
        let doc = json!({
            "email": "a@example.com",
            "role": "user",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let err = Profile::from_document(IdentityId::new("uid-1"), doc).unwrap_err();
        assert!(err.to_string().contains("authorized"));
    }

    #[test]
    fn document_with_unknown_role_fails_closed() {
        let doc = json!({
            "email": "a@example.com",
            "authorized": false,
            "role": "owner",
            "created_at": "2024-01-01T00:00:00Z"
        });
        let err = Profile::from_document(IdentityId::new("uid-1"), doc).unwrap_err();
        assert!(err.to_string().contains("owner"));
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Bob@Example.COM "), "bob@example.com");
    }
}
