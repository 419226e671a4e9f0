//! Lesson video repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_gate_catalog::{ContentError, ContentStore, EmbedDescriptor, VideoRecord, resolve};
use lesson_gate_core::VideoId;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use tracing::{debug, instrument};

/// Row type for video queries.
#[derive(FromRow)]
struct VideoRow {
    id: String,
    title: Option<String>,
    source_url: String,
    embed: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl VideoRow {
    fn try_into_record(self) -> Result<VideoRecord, ContentError> {
        let id = VideoId::from_str(&self.id).map_err(|e| ContentError::StoreUnavailable {
            details: format!("invalid video id '{}': {}", self.id, e),
        })?;

        // The embed form is derived from the source URL; re-derive it when the
        // stored copy does not decode.
        let embed = serde_json::from_value::<EmbedDescriptor>(self.embed).unwrap_or_else(|e| {
            tracing::warn!(video_id = %id, error = %e, "Stored embed did not decode, resolving again");
            resolve(&self.source_url)
        });

        Ok(VideoRecord::with_all_fields(
            id,
            self.title,
            self.source_url,
            embed,
            self.created_at,
        ))
    }
}

fn unavailable(e: sqlx::Error) -> ContentError {
    tracing::error!(error = %e, "Content store query failed");
    ContentError::StoreUnavailable {
        details: e.to_string(),
    }
}

/// Content store backed by the `videos` table.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    /// Creates a new content store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    #[instrument(skip(self))]
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, ContentError> {
        let rows: Vec<VideoRow> = sqlx::query_as(
            r#"
            SELECT id, title, source_url, embed, created_at
            FROM videos
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(VideoRow::try_into_record).collect()
    }

    #[instrument(skip(self, record), fields(video_id = %record.id()))]
    async fn add_video(&self, record: VideoRecord) -> Result<VideoId, ContentError> {
        let embed = serde_json::to_value(record.embed()).map_err(|e| ContentError::InvalidInput {
            reason: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO videos (id, title, source_url, embed, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id().to_string())
        .bind(record.title())
        .bind(record.source_url())
        .bind(embed)
        .bind(record.created_at())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        debug!(kind = %record.embed().kind(), "Video stored");
        Ok(record.id())
    }

    #[instrument(skip(self), fields(video_id = %id))]
    async fn delete_video(&self, id: VideoId) -> Result<(), ContentError> {
        let result = sqlx::query(
            r#"
            DELETE FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(ContentError::NotFound { id: id.to_string() });
        }
        debug!("Video deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_gate_catalog::EmbedKind;

    fn row(id: String, embed: serde_json::Value) -> VideoRow {
        VideoRow {
            id,
            title: Some("Intro".to_string()),
            source_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            embed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn row_keeps_stored_embed() {
        let stored = resolve("https://youtu.be/dQw4w9WgXcQ");
        let id = VideoId::new();
        let record = row(id.to_string(), serde_json::to_value(&stored).unwrap())
            .try_into_record()
            .unwrap();
        assert_eq!(record.id(), id);
        assert_eq!(record.embed(), &stored);
    }

    #[test]
    fn undecodable_embed_is_resolved_from_source() {
        let record = row(VideoId::new().to_string(), serde_json::json!({ "kind": "hologram" }))
            .try_into_record()
            .unwrap();
        assert_eq!(record.embed().kind(), EmbedKind::YouTube);
        assert_eq!(
            record.embed().embed_url().as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0&modestbranding=1")
        );
    }

    #[test]
    fn bad_id_is_reported() {
        let err = row("not-an-id".to_string(), serde_json::Value::Null)
            .try_into_record()
            .unwrap_err();
        assert!(err.to_string().contains("not-an-id"));
    }
}
