//! Database repository for sign-in sessions.

use chrono::{DateTime, Utc};
use lesson_gate_platform_access::{Identity, IdentityId, Session, SessionId};
use sqlx::{FromRow, PgPool};

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    id: String,
    identity_id: String,
    email: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session::with_all_fields(
            SessionId::new(row.id),
            Identity::new(row.identity_id, row.email),
            row.created_at,
            row.expires_at,
        )
    }
}

/// Repository for session operations.
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Creates a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a session by ID.
    pub async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, sqlx::Error> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, identity_id, email, created_at, expires_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Session::from))
    }

    /// Creates a new session.
    pub async fn create(&self, session: &Session) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, identity_id, email, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id().as_str())
        .bind(session.identity().id().as_str())
        .bind(session.identity().email_address())
        .bind(session.created_at())
        .bind(session.expires_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a session by ID (logout).
    pub async fn delete(&self, id: &SessionId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes all sessions of an identity.
    pub async fn delete_all_for_identity(&self, identity_id: &IdentityId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE identity_id = $1
            "#,
        )
        .bind(identity_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Deletes expired sessions.
    pub async fn delete_expired(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// Generates a unique session ID using ULID.
pub fn generate_session_id() -> SessionId {
    SessionId::new(ulid::Ulid::new().to_string())
}
