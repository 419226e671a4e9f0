//! Helper functions for server functions with proper error handling and logging.
//!
//! This module provides the common steps of every page server function:
//! resolving the signed-in identity from the session cookie and wiring a
//! session controller to the PostgreSQL stores.

use crate::auth::{SESSION_COOKIE, SessionSignOut, db::SessionRepository};
use crate::db::{PgContentStore, PgProfileStore};
use crate::error::SessionError;
use leptos::prelude::*;
use lesson_gate_catalog::ContentService;
use lesson_gate_platform_access::{AccessGate, Area, Identity, Session, SessionId};
use lesson_gate_portal::{IdentityChanged, PageView, RecordingSurface, SessionController};
use sqlx::PgPool;
use std::sync::Arc;

/// Extracts and validates the current session from the request.
///
/// This function:
/// 1. Gets the session cookie
/// 2. Looks up the session in the database
/// 3. Validates the session is not expired
///
/// Logs structured errors for debugging while returning user-safe error types.
pub async fn get_authenticated_session() -> Result<Session, SessionError> {
    // Get session cookie
    let session_id_str = leptos_axum::extract::<axum_extra::extract::CookieJar>()
        .await
        .map_err(|e| {
            tracing::debug!(error = %e, "Failed to extract cookie jar");
            SessionError::NotAuthenticated
        })?
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(SessionError::NotAuthenticated)?;

    let session_id = SessionId::new(session_id_str.clone());

    let pool = expect_context::<PgPool>();
    let session_repo = SessionRepository::new(pool);

    let session = session_repo
        .find_by_id(&session_id)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                session_id = %session_id_str,
                "Database error looking up session"
            );
            SessionError::DatabaseError {
                details: e.to_string(),
            }
        })?
        .ok_or_else(|| {
            tracing::debug!(session_id = %session_id_str, "Session not found in database");
            SessionError::NotFound {
                session_id: session_id_str.clone(),
            }
        })?;

    if session.is_expired() {
        tracing::debug!(session_id = %session_id_str, "Session expired");
        return Err(SessionError::Expired {
            session_id: session_id_str,
        });
    }

    Ok(session)
}

/// Returns the signed-in identity, or `None` for an anonymous visitor.
///
/// A missing, unknown, or expired session is an anonymous visitor; only a
/// database failure is an error.
pub async fn current_identity() -> Result<Option<Identity>, SessionError> {
    match get_authenticated_session().await {
        Ok(session) => Ok(Some(session.identity().clone())),
        Err(e) if e.is_anonymous() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Builds a session controller for one request against the database stores.
pub fn page_controller(area: Area) -> SessionController<RecordingSurface> {
    let pool = expect_context::<PgPool>();
    let profiles = Arc::new(PgProfileStore::new(pool.clone()));
    let videos = Arc::new(PgContentStore::new(pool.clone()));

    SessionController::new(
        area,
        AccessGate::new(profiles.clone()),
        ContentService::new(videos, profiles),
        Arc::new(SessionSignOut::new(pool)),
        RecordingSurface::new(),
    )
}

/// Renders `area` for the current request's identity.
///
/// Returns the controller so admin commands can be dispatched against the
/// same evaluated page.
pub async fn render_area(
    area: Area,
) -> Result<SessionController<RecordingSurface>, SessionError> {
    let identity = current_identity().await?;
    let controller = page_controller(area);
    let outcome = controller.handle(IdentityChanged(identity)).await;
    tracing::debug!(area = %area, outcome = ?outcome, "Rendered page");
    Ok(controller)
}

/// Returns the view a controller rendered last.
pub fn finished_view(controller: SessionController<RecordingSurface>) -> PageView {
    controller.into_surface().into_current()
}
