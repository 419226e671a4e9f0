//! The content store collaborator.

use async_trait::async_trait;
use lesson_gate_core::VideoId;

use crate::error::ContentError;
use crate::video::VideoRecord;

/// Persistence for lesson videos.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Lists all videos in lesson order (ascending `created_at`, then id).
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, ContentError>;

    /// Stores a new video record.
    async fn add_video(&self, record: VideoRecord) -> Result<VideoId, ContentError>;

    /// Deletes a video record.
    ///
    /// Returns `ContentError::NotFound` if no record has this id.
    async fn delete_video(&self, id: VideoId) -> Result<(), ContentError>;
}
