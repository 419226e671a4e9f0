//! Admin row actions.

use lesson_gate_core::VideoId;
use lesson_gate_platform_access::{IdentityId, ViewMode};
use std::fmt;

/// An action an admin takes from the management lists.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminCommand {
    /// Let a student watch lessons.
    Authorize { id: IdentityId },
    /// Take a student's access away.
    Revoke { id: IdentityId },
    /// Delete a lesson.
    RemoveVideo { id: VideoId },
    /// Add a lesson from a link.
    AddVideo {
        title: Option<String>,
        source_url: String,
    },
}

impl AdminCommand {
    /// Returns the action name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Authorize { .. } => "authorize",
            Self::Revoke { .. } => "revoke",
            Self::RemoveVideo { .. } => "remove_video",
            Self::AddVideo { .. } => "add_video",
        }
    }

    /// Returns the notice text shown when the action fails.
    #[must_use]
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Authorize { .. } => "Could not authorize the student.",
            Self::Revoke { .. } => "Could not revoke access.",
            Self::RemoveVideo { .. } => "Could not remove the lesson.",
            Self::AddVideo { .. } => "Could not add the lesson. Check the link and try again.",
        }
    }
}

/// Errors from dispatching admin commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The page is not in admin mode.
    NotPermitted { mode: Option<ViewMode> },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPermitted { mode: Some(mode) } => {
                write!(f, "admin commands are not accepted in mode {mode}")
            }
            Self::NotPermitted { mode: None } => {
                write!(f, "admin commands are not accepted before the page is evaluated")
            }
        }
    }
}

impl std::error::Error for CommandError {}
