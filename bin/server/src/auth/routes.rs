//! Authentication routes for login, callback, and logout.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Duration as ChronoDuration;
use lesson_gate_platform_access::{AuthenticationError, Session, SessionId, register_profile};
use openidconnect::url::form_urlencoded;
use serde::Deserialize;
use std::sync::Arc;
use time::Duration as TimeDuration;

use super::{
    AppState,
    db::{SessionRepository, generate_session_id},
    oidc::AuthState,
};
use crate::db::PgProfileStore;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "session";

/// Auth state cookie name (for CSRF protection during OIDC flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Query parameters for the OIDC callback.
///
/// A provider that refuses the sign-in sends `error` instead of `code`.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Initiates the OIDC login flow by redirecting to the identity provider.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (auth_url, auth_state) = state.oidc_client.authorization_url();

    // Store the auth state in a secure cookie for validation on callback
    let auth_state_json = serde_json::to_string(&AuthStateData {
        csrf_token: auth_state.csrf_token,
        pkce_verifier: auth_state.pkce_verifier,
        nonce: auth_state.nonce,
    })
    .map_err(|_| AuthError::InvalidAuthState)?;

    let cookie = Cookie::build((AUTH_STATE_COOKIE, auth_state_json))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(10));

    Ok((jar.add(cookie), Redirect::to(&auth_url)))
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
///
/// A successful sign-in provisions the profile on first visit and opens a
/// session. Whether the identity may watch anything is left to the access
/// gate on the next page render.
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    if let Some(error) = query.error {
        let reason = query.error_description.unwrap_or(error);
        return Err(AuthError::SignIn(AuthenticationError::AuthFailure {
            reason,
        }));
    }

    // Retrieve and validate auth state from cookie
    let auth_state_cookie = jar
        .get(AUTH_STATE_COOKIE)
        .ok_or(AuthError::MissingAuthState)?;

    let auth_state_data: AuthStateData =
        serde_json::from_str(auth_state_cookie.value()).map_err(|_| AuthError::InvalidAuthState)?;

    // Validate CSRF token
    if query.state.as_deref() != Some(auth_state_data.csrf_token.as_str()) {
        return Err(AuthError::CsrfMismatch);
    }
    let code = query.code.ok_or(AuthError::MissingCode)?;

    let auth_state = AuthState {
        csrf_token: auth_state_data.csrf_token,
        pkce_verifier: auth_state_data.pkce_verifier,
        nonce: auth_state_data.nonce,
    };

    // Exchange the authorization code for tokens
    let claims = state
        .oidc_client
        .exchange_code(&code, &auth_state)
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let identity = claims.identity().map_err(AuthError::SignIn)?;
    let role = state.oidc_client.config().provisioned_role(&claims.groups);

    let profiles = PgProfileStore::new(state.db_pool.clone());
    let registration = register_profile(&profiles, identity, claims.display_name.clone(), role)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

    // Create session
    let session_id = generate_session_id();
    let session_duration = state.session_config.duration_minutes;
    let session = Session::new(
        session_id.clone(),
        registration.identity,
        ChronoDuration::minutes(session_duration),
    );

    let session_repo = SessionRepository::new(state.db_pool.clone());
    session_repo
        .create(&session)
        .await
        .map_err(|e| AuthError::Database(e.to_string()))?;

    tracing::info!(
        identity_id = %session.identity().id(),
        new_profile = registration.is_new,
        "Signed in"
    );

    // Set session cookie
    let session_cookie = Cookie::build((SESSION_COOKIE, session_id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(state.session_config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(session_duration));

    // Remove auth state cookie
    let remove_auth_state = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    let jar = jar.add(session_cookie).add(remove_auth_state);

    Ok((jar, Redirect::to("/")))
}

/// Signs the user out by deleting their session.
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let session_id = SessionId::new(session_cookie.value().to_string());

        let session_repo = SessionRepository::new(state.db_pool.clone());
        if let Err(e) = session_repo.delete(&session_id).await {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }
    }

    // Remove session cookie
    let remove_session = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(TimeDuration::ZERO);

    (jar.add(remove_session), Redirect::to("/login"))
}

/// Serializable auth state for cookie storage.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct AuthStateData {
    csrf_token: String,
    pkce_verifier: String,
    nonce: String,
}

/// Authentication errors.
#[derive(Debug)]
pub enum AuthError {
    MissingAuthState,
    InvalidAuthState,
    CsrfMismatch,
    MissingCode,
    TokenExchange(String),
    /// The provider refused the sign-in, or its claims were unusable.
    SignIn(AuthenticationError),
    Database(String),
}

/// Builds the entry page URL that shows `reason` to the user.
pub fn sign_in_failed_location(reason: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", reason)
        .finish();
    format!("/login?{query}")
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::MissingAuthState => (StatusCode::BAD_REQUEST, "Missing auth state"),
            Self::InvalidAuthState => (StatusCode::BAD_REQUEST, "Invalid auth state"),
            Self::CsrfMismatch => (StatusCode::BAD_REQUEST, "CSRF token mismatch"),
            Self::MissingCode => (StatusCode::BAD_REQUEST, "Missing authorization code"),
            Self::TokenExchange(msg) => {
                tracing::error!("Token exchange failed: {}", msg);
                return Redirect::to(&sign_in_failed_location("Authentication failed"))
                    .into_response();
            }
            Self::SignIn(err) => {
                tracing::warn!(error = %err, "Sign-in rejected");
                return Redirect::to(&sign_in_failed_location(&err.to_string())).into_response();
            }
            Self::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
