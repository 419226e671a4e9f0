//! Video records in the lesson catalog.

use chrono::{DateTime, Utc};
use lesson_gate_core::VideoId;
use serde::{Deserialize, Serialize};

use crate::link::{EmbedDescriptor, resolve};

/// Title shown for lessons added without one.
pub const UNTITLED_LESSON: &str = "Untitled lesson";

/// A lesson video. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    id: VideoId,
    title: Option<String>,
    source_url: String,
    embed: EmbedDescriptor,
    created_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Creates a record for a newly added link, resolving its embed form.
    #[must_use]
    pub fn new(title: Option<String>, source_url: &str) -> Self {
        let source_url = source_url.trim().to_string();
        Self {
            id: VideoId::new(),
            title: title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            embed: resolve(&source_url),
            source_url,
            created_at: Utc::now(),
        }
    }

    /// Creates a record with all fields specified.
    ///
    /// Use this when reconstituting a record from storage.
    #[must_use]
    pub fn with_all_fields(
        id: VideoId,
        title: Option<String>,
        source_url: String,
        embed: EmbedDescriptor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            source_url,
            embed,
            created_at,
        }
    }

    /// Returns the record ID.
    #[must_use]
    pub fn id(&self) -> VideoId {
        self.id
    }

    /// Returns the title as entered, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the title, or the placeholder for untitled lessons.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNTITLED_LESSON)
    }

    /// Returns the link the admin entered.
    #[must_use]
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Returns the embed descriptor derived when the record was created.
    #[must_use]
    pub fn embed(&self) -> &EmbedDescriptor {
        &self.embed
    }

    /// Returns when the record was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Sorts records into lesson order: oldest first, ties broken by id.
pub fn sort_lessons(videos: &mut [VideoRecord]) {
    videos.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
