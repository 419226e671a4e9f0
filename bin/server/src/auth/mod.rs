//! Authentication module for the lesson-gate server.
//!
//! This module provides:
//! - OIDC authentication with an external identity provider
//! - Database-backed sign-in sessions
//! - The server-side [`IdentityProvider`] used to force a sign-out
//!
//! # Authorization Model
//!
//! A session only says who signed in. What that identity may see is decided
//! by the access gate from the stored profile on every page render, so an
//! admin's authorize or revoke takes effect on the student's next page load
//! without touching the session. Group membership only matters once: members
//! of the configured admin group are provisioned as admins on first sign-in.

pub mod db;
pub mod oidc;
pub mod routes;

use async_trait::async_trait;
use lesson_gate_platform_access::{AuthenticationError, Identity, IdentityProvider};
use sqlx::PgPool;

use crate::config::SessionConfig;
use db::SessionRepository;

pub use oidc::OidcClient;
pub use routes::{SESSION_COOKIE, callback, login, logout};

/// Shared application state.
pub struct AppState {
    /// Database connection pool.
    pub db_pool: PgPool,
    /// OIDC client for authentication.
    pub oidc_client: OidcClient,
    /// Session configuration.
    pub session_config: SessionConfig,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(db_pool: PgPool, oidc_client: OidcClient, session_config: SessionConfig) -> Self {
        Self {
            db_pool,
            oidc_client,
            session_config,
        }
    }
}

/// Signs identities out by deleting their server-side sessions.
///
/// The browser keeps a dangling cookie, which no longer resolves to an
/// identity on the next request.
pub struct SessionSignOut {
    sessions: SessionRepository,
}

impl SessionSignOut {
    /// Creates a sign-out provider backed by the session table.
    pub fn new(pool: PgPool) -> Self {
        Self {
            sessions: SessionRepository::new(pool),
        }
    }
}

#[async_trait]
impl IdentityProvider for SessionSignOut {
    async fn sign_out(&self, identity: &Identity) -> Result<(), AuthenticationError> {
        let deleted = self
            .sessions
            .delete_all_for_identity(identity.id())
            .await
            .map_err(|e| AuthenticationError::ProviderError {
                provider: "sessions".to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(identity_id = %identity.id(), deleted_sessions = deleted, "Signed identity out");
        Ok(())
    }
}
