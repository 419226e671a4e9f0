//! Error types for the platform-access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AuthenticationError`: Identity provider failures (bad credentials, session)
//! - `AccessError`: Failures while deciding what an identity may see
//! - `StoreError`: Failures reported by a `ProfileStore` implementation

use crate::identity::IdentityId;
use std::fmt;

/// Errors from authentication operations.
///
/// These errors represent failures in verifying who the caller is. They are
/// surfaced verbatim and never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The identity provider rejected the credentials.
    AuthFailure { reason: String },
    /// Session not found or invalid.
    InvalidSession { session_id: String },
    /// Session has expired.
    SessionExpired { session_id: String },
    /// Identity provider error.
    ProviderError { provider: String, reason: String },
    /// Missing required claim in token.
    MissingClaim { claim: String },
}

impl fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthFailure { reason } => write!(f, "{reason}"),
            Self::InvalidSession { session_id } => {
                write!(f, "invalid session: {session_id}")
            }
            Self::SessionExpired { session_id } => {
                write!(f, "session has expired: {session_id}")
            }
            Self::ProviderError { provider, reason } => {
                write!(f, "identity provider '{provider}' error: {reason}")
            }
            Self::MissingClaim { claim } => {
                write!(f, "missing required claim: {claim}")
            }
        }
    }
}

impl std::error::Error for AuthenticationError {}

/// Errors from access decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The profile store could not be read or written.
    StoreUnavailable { details: String },
    /// An authenticated identity has no usable profile record.
    ProfileMissing { identity_id: IdentityId },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable { details } => {
                write!(f, "profile store unavailable: {details}")
            }
            Self::ProfileMissing { identity_id } => {
                write!(f, "no profile found for identity {identity_id}")
            }
        }
    }
}

impl std::error::Error for AccessError {}

impl From<StoreError> for AccessError {
    fn from(e: StoreError) -> Self {
        Self::StoreUnavailable {
            details: e.to_string(),
        }
    }
}

/// Errors reported by profile store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or the query failed.
    Unavailable { details: String },
    /// A stored record exists but does not satisfy the profile schema.
    InvalidRecord { id: String, reason: String },
    /// A mutation targeted a record that does not exist.
    NotFound { id: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { details } => write!(f, "store unavailable: {details}"),
            Self::InvalidRecord { id, reason } => {
                write!(f, "invalid profile record '{id}': {reason}")
            }
            Self::NotFound { id } => write!(f, "profile '{id}' not found"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_is_surfaced_verbatim() {
        let err = AuthenticationError::AuthFailure {
            reason: "wrong password".to_string(),
        };
        assert_eq!(err.to_string(), "wrong password");
    }

    #[test]
    fn authentication_error_provider_error_display() {
        let err = AuthenticationError::ProviderError {
            provider: "keycloak".to_string(),
            reason: "connection timeout".to_string(),
        };
        assert!(err.to_string().contains("keycloak"));
        assert!(err.to_string().contains("connection timeout"));
    }

    #[test]
    fn access_error_profile_missing_display() {
        let err = AccessError::ProfileMissing {
            identity_id: IdentityId::new("uid-42"),
        };
        assert!(err.to_string().contains("uid-42"));
    }

    #[test]
    fn store_error_converts_to_store_unavailable() {
        let err: AccessError = StoreError::Unavailable {
            details: "connection refused".to_string(),
        }
        .into();
        match err {
            AccessError::StoreUnavailable { details } => {
                assert!(details.contains("connection refused"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn store_error_invalid_record_display() {
        let err = StoreError::InvalidRecord {
            id: "uid-1".to_string(),
            reason: "unknown role 'owner'".to_string(),
        };
        assert!(err.to_string().contains("uid-1"));
        assert!(err.to_string().contains("owner"));
    }
}
