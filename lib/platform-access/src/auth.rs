//! Sign-in claims and profile registration.
//!
//! The identity provider verifies credentials and hands back claims. This
//! module turns those claims into an `Identity` and makes sure the identity
//! has a profile before its first page render, so the gate never meets an
//! authenticated identity without one in normal operation.

use tracing::{info, instrument};

use crate::error::{AccessError, AuthenticationError};
use crate::identity::Identity;
use crate::profile::Profile;
use crate::role::Role;
use crate::store::ProfileStore;

/// Claims extracted from an OIDC ID token.
#[derive(Debug, Clone)]
pub struct OidcClaims {
    /// The subject claim (unique user identifier from the provider).
    pub subject: String,
    /// The issuer URL.
    pub issuer: String,
    /// Email address (optional).
    pub email: Option<String>,
    /// Display name (optional, from name or preferred_username).
    pub display_name: Option<String>,
    /// Group memberships (from the configured groups claim).
    pub groups: Vec<String>,
}

impl OidcClaims {
    /// Creates a new set of OIDC claims.
    #[must_use]
    pub fn new(subject: String, issuer: String) -> Self {
        Self {
            subject,
            issuer,
            email: None,
            display_name: None,
            groups: Vec::new(),
        }
    }

    /// Sets the email claim.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Sets the groups.
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Builds the identity these claims describe.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationError::MissingClaim` when the provider did not
    /// release an email address; profiles cannot be created without one.
    pub fn identity(&self) -> Result<Identity, AuthenticationError> {
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AuthenticationError::MissingClaim {
                claim: "email".to_string(),
            })?;
        Ok(Identity::new(self.subject.as_str(), email))
    }
}

/// Result of registering a signed-in identity.
#[derive(Debug, Clone)]
pub struct Registration {
    /// The identity that signed in.
    pub identity: Identity,
    /// Its profile, existing or newly created.
    pub profile: Profile,
    /// Whether the profile was created by this sign-in.
    pub is_new: bool,
}

/// Ensures `identity` has a profile, creating one with `authorized = false`
/// when it does not.
///
/// An existing profile is never modified: a returning admin keeps the role
/// stored on the profile, not the one the provider's groups would suggest.
///
/// # Errors
///
/// Returns `AccessError::StoreUnavailable` if the store cannot be read or
/// written.
#[instrument(skip(store, identity, display_name), fields(identity_id = %identity.id()))]
pub async fn register_profile(
    store: &dyn ProfileStore,
    identity: Identity,
    display_name: Option<String>,
    role: Role,
) -> lesson_gate_core::Result<Registration, AccessError> {
    let (profile, is_new) = store
        .provision(&identity, display_name, role)
        .await
        .map_err(AccessError::from)?;

    if is_new {
        info!(role = %profile.role(), "registered new profile awaiting authorization");
    }

    Ok(Registration {
        identity,
        profile,
        is_new,
    })
}
