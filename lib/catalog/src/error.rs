//! Error types for the catalog crate.

use lesson_gate_platform_access::StoreError;
use std::fmt;

/// Errors from catalog and content operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// The content or profile store could not be read or written.
    StoreUnavailable { details: String },
    /// A mutation targeted a record that no longer exists.
    NotFound { id: String },
    /// Admin input was rejected before reaching the store.
    InvalidInput { reason: String },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoreUnavailable { details } => write!(f, "content store unavailable: {details}"),
            Self::NotFound { id } => write!(f, "record '{id}' not found"),
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<StoreError> for ContentError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { id } => Self::NotFound { id },
            other => Self::StoreUnavailable {
                details: other.to_string(),
            },
        }
    }
}
