//! Authenticated principals as reported by the identity provider.
//!
//! An `Identity` is created and destroyed by the external identity provider.
//! Nothing in this workspace mutates one; the gate only reads it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthenticationError;

/// Stable, provider-issued identifier of an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    /// Creates an identity ID from the provider's subject string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for IdentityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    id: IdentityId,
    email_address: String,
}

impl Identity {
    /// Creates an identity handle.
    #[must_use]
    pub fn new(id: impl Into<IdentityId>, email_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email_address: email_address.into(),
        }
    }

    /// Returns the stable identity ID.
    #[must_use]
    pub fn id(&self) -> &IdentityId {
        &self.id
    }

    /// Returns the email address reported by the provider.
    #[must_use]
    pub fn email_address(&self) -> &str {
        &self.email_address
    }
}

/// The external identity provider.
///
/// Providers deliver identity changes (sign-in, sign-out, session restore) to
/// the session controller; the controller calls back into the provider only
/// to end a session it cannot serve.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Ends the session of the given identity.
    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthenticationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_exposes_id_and_email() {
        let identity = Identity::new("uid-1", "ana@example.com");
        assert_eq!(identity.id().as_str(), "uid-1");
        assert_eq!(identity.email_address(), "ana@example.com");
    }

    #[test]
    fn identity_id_serializes_transparently() {
        let id = IdentityId::new("auth0|123");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"auth0|123\"");
    }
}
