//! Domain error types for server operations.
//!
//! Each error carries the detail needed for logs; `into_server_error`
//! converts it into the user-safe message a server function returns.

use leptos::server_fn::error::ServerFnError;
use std::fmt;

/// Session-related errors.
#[derive(Debug)]
pub enum SessionError {
    /// User is not authenticated (no session cookie).
    NotAuthenticated,
    /// Session was not found in database.
    NotFound { session_id: String },
    /// Session has expired.
    Expired { session_id: String },
    /// Database error while accessing session.
    DatabaseError { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not authenticated"),
            Self::NotFound { session_id } => {
                write!(f, "session '{}' not found", session_id)
            }
            Self::Expired { session_id } => {
                write!(f, "session '{}' has expired", session_id)
            }
            Self::DatabaseError { details } => {
                write!(f, "session database error: {}", details)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl SessionError {
    /// Returns true if the request simply carries no usable session.
    ///
    /// Pages treat these as an anonymous visitor rather than a failure.
    pub fn is_anonymous(&self) -> bool {
        !matches!(self, Self::DatabaseError { .. })
    }

    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            SessionError::NotAuthenticated => ServerFnError::new("Not authenticated"),
            SessionError::NotFound { .. } => ServerFnError::new("Session not found"),
            SessionError::Expired { .. } => ServerFnError::new("Session expired"),
            SessionError::DatabaseError { .. } => ServerFnError::new("Database error"),
        }
    }
}

/// Admin action errors.
#[derive(Debug)]
pub enum AdminError {
    /// Admin access is required for this operation.
    AdminRequired { mode: String },
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdminRequired { mode } => {
                write!(f, "admin access required, page is in mode '{}'", mode)
            }
        }
    }
}

impl std::error::Error for AdminError {}

impl AdminError {
    /// Convert to a user-safe ServerFnError.
    pub fn into_server_error(self) -> ServerFnError {
        match &self {
            AdminError::AdminRequired { .. } => ServerFnError::new("Admin access required"),
        }
    }
}
