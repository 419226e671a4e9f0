//! In-memory content store.

use async_trait::async_trait;
use lesson_gate_core::VideoId;
use std::sync::Mutex;
use tracing::debug;

use crate::error::ContentError;
use crate::store::ContentStore;
use crate::video::{VideoRecord, sort_lessons};

/// Content store backed by a vector.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    videos: Mutex<Vec<VideoRecord>>,
}

impl InMemoryContentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given records, in any order.
    #[must_use]
    pub fn with_videos(videos: Vec<VideoRecord>) -> Self {
        Self {
            videos: Mutex::new(videos),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<VideoRecord>> {
        self.videos
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, ContentError> {
        let mut videos = self.lock().clone();
        sort_lessons(&mut videos);
        Ok(videos)
    }

    async fn add_video(&self, record: VideoRecord) -> Result<VideoId, ContentError> {
        let id = record.id();
        self.lock().push(record);
        debug!(video_id = %id, "video stored");
        Ok(id)
    }

    async fn delete_video(&self, id: VideoId) -> Result<(), ContentError> {
        let mut videos = self.lock();
        let before = videos.len();
        videos.retain(|v| v.id() != id);
        if videos.len() == before {
            return Err(ContentError::NotFound { id: id.to_string() });
        }
        debug!(video_id = %id, "video deleted");
        Ok(())
    }
}
