//! Content service: the catalog and profile operations pages call.
//!
//! Every call goes straight to the stores. Nothing is cached, so callers
//! re-list after each mutation and never act on superseded rows.

use lesson_gate_core::VideoId;
use lesson_gate_platform_access::{IdentityId, Profile, ProfilePatch, ProfileStore};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::error::ContentError;
use crate::store::ContentStore;
use crate::video::VideoRecord;

/// Lists and mutates lessons and profiles.
#[derive(Clone)]
pub struct ContentService {
    videos: Arc<dyn ContentStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ContentService {
    /// Creates a service over the given stores.
    #[must_use]
    pub fn new(videos: Arc<dyn ContentStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { videos, profiles }
    }

    /// Lists lessons, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::StoreUnavailable` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list_videos(&self) -> lesson_gate_core::Result<Vec<VideoRecord>, ContentError> {
        self.videos.list_videos().await.map_err(|e| {
            error!(error = %e, "failed to list videos");
            e.into()
        })
    }

    /// Adds a lesson from an admin-entered title and link.
    ///
    /// Links no provider recognizes are still stored; they render as an
    /// "unsupported link" notice.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::InvalidInput` for a blank link, or
    /// `ContentError::StoreUnavailable` if the store write fails.
    #[instrument(skip(self, title))]
    pub async fn add_video(
        &self,
        title: Option<String>,
        source_url: &str,
    ) -> lesson_gate_core::Result<VideoRecord, ContentError> {
        if source_url.trim().is_empty() {
            return Err(ContentError::InvalidInput {
                reason: "source URL is blank".to_string(),
            }
            .into());
        }

        let record = VideoRecord::new(title, source_url);
        let id = self.videos.add_video(record.clone()).await?;
        info!(video_id = %id, kind = %record.embed().kind(), "lesson added");
        Ok(record)
    }

    /// Removes a lesson.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::NotFound` if the lesson is already gone, or
    /// `ContentError::StoreUnavailable` if the store write fails.
    #[instrument(skip(self))]
    pub async fn remove_video(&self, id: VideoId) -> lesson_gate_core::Result<(), ContentError> {
        self.videos.delete_video(id).await?;
        info!(video_id = %id, "lesson removed");
        Ok(())
    }

    /// Lists profiles, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::StoreUnavailable` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list_profiles(&self) -> lesson_gate_core::Result<Vec<Profile>, ContentError> {
        self.profiles.list_profiles().await.map_err(|e| {
            error!(error = %e, "failed to list profiles");
            ContentError::from(e).into()
        })
    }

    /// Sets a profile's authorization flag.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::NotFound` if the profile does not exist, or
    /// `ContentError::StoreUnavailable` if the store write fails.
    #[instrument(skip(self))]
    pub async fn set_authorized(
        &self,
        id: &IdentityId,
        authorized: bool,
    ) -> lesson_gate_core::Result<(), ContentError> {
        self.profiles
            .set_profile(id, ProfilePatch::authorized(authorized))
            .await
            .map_err(ContentError::from)?;
        info!(identity_id = %id, authorized, "profile authorization changed");
        Ok(())
    }
}
