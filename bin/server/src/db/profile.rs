//! Profile repository.
//!
//! Profiles are stored as JSONB documents and validated on every read, so a
//! hand-edited or partially written row is reported as invalid instead of
//! being read with defaults.

use async_trait::async_trait;
use lesson_gate_platform_access::{
    Identity, IdentityId, Profile, ProfilePatch, ProfileStore, Role, StoreError, normalize_email,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument, warn};

/// Row type for profile queries.
#[derive(FromRow)]
struct ProfileRow {
    identity_id: String,
    document: serde_json::Value,
}

impl ProfileRow {
    fn try_into_profile(self) -> Result<Profile, StoreError> {
        Profile::from_document(IdentityId::new(self.identity_id), self.document)
    }
}

/// Converts listed rows, skipping the ones whose document fails validation.
fn valid_profiles(rows: Vec<ProfileRow>) -> Vec<Profile> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.identity_id.clone();
            match row.try_into_profile() {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(identity_id = %id, error = %e, "Skipping invalid profile document");
                    None
                }
            }
        })
        .collect()
}

fn unavailable(e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, "Profile store query failed");
    StoreError::Unavailable {
        details: e.to_string(),
    }
}

/// Profile store backed by the `profiles` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Creates a new profile store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_if_absent(&self, profile: &Profile) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (identity_id, email_lower, document, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (identity_id) DO NOTHING
            "#,
        )
        .bind(profile.identity_id().as_str())
        .bind(profile.email_key())
        .bind(profile.to_document())
        .bind(profile.created_at())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self), fields(identity_id = %id))]
    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT identity_id, document
            FROM profiles
            WHERE identity_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ProfileRow::try_into_profile).transpose()
    }

    #[instrument(skip(self, patch), fields(identity_id = %id))]
    async fn set_profile(&self, id: &IdentityId, patch: ProfilePatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT identity_id, document
            FROM profiles
            WHERE identity_id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let mut profile = row
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?
            .try_into_profile()?;
        profile.apply(&patch);

        sqlx::query(
            r#"
            UPDATE profiles
            SET email_lower = $2, document = $3
            WHERE identity_id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(profile.email_key())
        .bind(profile.to_document())
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        debug!("Profile updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT identity_id, document
            FROM profiles
            WHERE email_lower = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ProfileRow::try_into_profile).transpose()
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let rows: Vec<ProfileRow> = sqlx::query_as(
            r#"
            SELECT identity_id, document
            FROM profiles
            ORDER BY created_at DESC, identity_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(valid_profiles(rows))
    }

    #[instrument(skip(self, identity, display_name), fields(identity_id = %identity.id()))]
    async fn provision(
        &self,
        identity: &Identity,
        display_name: Option<String>,
        role: Role,
    ) -> Result<(Profile, bool), StoreError> {
        let profile = Profile::new(identity, display_name, role);
        let inserted = self
            .insert_if_absent(&profile)
            .await
            .map_err(unavailable)?;
        if inserted > 0 {
            debug!(role = %role, "Profile provisioned");
            return Ok((profile, true));
        }

        let existing = self
            .get_profile(identity.id())
            .await?
            .ok_or_else(|| StoreError::NotFound {
                id: identity.id().to_string(),
            })?;
        Ok((existing, false))
    }
}
