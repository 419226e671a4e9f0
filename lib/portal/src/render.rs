//! What a page shows, and the surface it is shown on.
//!
//! The session controller produces one [`PageView`] per render pass. Views
//! are plain serializable data so the server can hand them to the browser,
//! which only draws them.

use lesson_gate_catalog::{EmbedDescriptor, EmbedKind, Presentation, VideoRecord};
use lesson_gate_platform_access::Profile;

use crate::guard::{DocumentHandle, PlayerHandle, ShortcutPolicy};

/// Where a redirect sends the browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The sign-in entry page.
    Entry,
    /// The student dashboard.
    Dashboard,
}

impl Destination {
    /// Returns the route path.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Entry => "/login",
            Self::Dashboard => "/",
        }
    }

    /// Returns the URL to redirect to, carrying `notice` when it has a code.
    #[must_use]
    pub fn location(&self, notice: Option<&Notice>) -> String {
        match notice.and_then(Notice::code) {
            Some(code) => format!("{}?notice={code}", self.path()),
            None => self.path().to_string(),
        }
    }
}

/// A short, non-blocking message shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// An authenticated identity had no usable profile and was signed out.
    ProfileMissing,
    /// A non-admin asked for the admin area.
    AccessDenied,
    /// A profile or content store call failed.
    StoreUnavailable,
    /// The identity provider rejected the sign-in.
    SignInFailed { reason: String },
    /// An admin action did not go through.
    ActionFailed { message: String },
}

impl Notice {
    /// Returns the text shown to the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::ProfileMissing => "Account profile not found.",
            Self::AccessDenied => "Access denied.",
            Self::StoreUnavailable => "Lessons are unavailable right now. Please try again later.",
            Self::SignInFailed { reason } => reason.as_str(),
            Self::ActionFailed { message } => message.as_str(),
        }
    }

    /// Returns the short code that carries a fixed-text notice in a URL.
    ///
    /// Notices with free text have no code.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::ProfileMissing => Some("profile_missing"),
            Self::AccessDenied => Some("access_denied"),
            Self::StoreUnavailable => Some("store_unavailable"),
            Self::SignInFailed { .. } | Self::ActionFailed { .. } => None,
        }
    }

    /// Looks a fixed-text notice up by its code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "profile_missing" => Some(Self::ProfileMissing),
            "access_denied" => Some(Self::AccessDenied),
            "store_unavailable" => Some(Self::StoreUnavailable),
            _ => None,
        }
    }
}

/// Restrictions applied to a rendered player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlayerRestrictions {
    pub no_picture_in_picture: bool,
    pub no_download: bool,
    pub overlay: bool,
}

/// One lesson as a student sees it.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    pub embed: EmbedDescriptor,
    pub presentation: Presentation,
    pub embed_url: Option<String>,
    pub restrictions: PlayerRestrictions,
}

impl From<&VideoRecord> for LessonView {
    fn from(video: &VideoRecord) -> Self {
        let embed = video.embed().clone();
        Self {
            id: video.id().to_string(),
            title: video.display_title().to_string(),
            presentation: embed.presentation(),
            embed_url: embed.embed_url(),
            embed,
            restrictions: PlayerRestrictions::default(),
        }
    }
}

impl PlayerHandle for LessonView {
    fn presentation(&self) -> Presentation {
        self.presentation
    }

    fn disable_picture_in_picture(&mut self) {
        self.restrictions.no_picture_in_picture = true;
    }

    fn disable_download(&mut self) {
        self.restrictions.no_download = true;
    }

    fn set_overlay(&mut self, shown: bool) {
        self.restrictions.overlay = shown;
    }
}

/// A profile row in the admin list.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProfileRow {
    pub identity_id: String,
    pub label: String,
    pub email: String,
    pub authorized: bool,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<&Profile> for ProfileRow {
    fn from(profile: &Profile) -> Self {
        Self {
            identity_id: profile.identity_id().to_string(),
            label: profile.label().to_string(),
            email: profile.email_address().to_string(),
            authorized: profile.is_authorized(),
            is_admin: profile.role().is_admin(),
            created_at: profile.created_at().to_rfc3339(),
        }
    }
}

/// A video row in the admin list.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoRow {
    pub id: String,
    pub title: String,
    pub source_url: String,
    pub kind: EmbedKind,
    pub created_at: String,
}

impl From<&VideoRecord> for VideoRow {
    fn from(video: &VideoRecord) -> Self {
        Self {
            id: video.id().to_string(),
            title: video.display_title().to_string(),
            source_url: video.source_url().to_string(),
            kind: video.embed().kind(),
            created_at: video.created_at().to_rfc3339(),
        }
    }
}

/// The complete content of one render pass.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PageView {
    /// Nothing decided yet.
    Loading,
    /// Leave this page.
    Redirect {
        to: Destination,
        notice: Option<Notice>,
    },
    /// Signed in, waiting for an admin to authorize the profile.
    Pending { name: String },
    /// A terminal failure after the gate passed.
    Unavailable { notice: Notice },
    /// The student dashboard.
    Lessons {
        name: String,
        is_admin: bool,
        lessons: Vec<LessonView>,
    },
    /// The admin management lists.
    Admin {
        name: String,
        profiles: Vec<ProfileRow>,
        videos: Vec<VideoRow>,
        notice: Option<Notice>,
    },
}

impl PageView {
    /// Returns the lessons on the page, if it shows any.
    pub fn lessons_mut(&mut self) -> &mut [LessonView] {
        match self {
            Self::Lessons { lessons, .. } => lessons,
            _ => &mut [],
        }
    }
}

/// The single surface a session controller draws on.
///
/// Only the controller writes to it.
pub trait RenderSurface: Send {
    /// Replaces the surface content with `view`.
    fn render(&mut self, view: PageView);

    /// Returns the players currently on the surface.
    fn players(&mut self) -> Vec<&mut dyn PlayerHandle>;

    /// Returns the document the surface lives in.
    fn document(&mut self) -> &mut dyn DocumentHandle;
}

/// Document state recorded by [`RecordingSurface`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordedDocument {
    suppression: Option<ShortcutPolicy>,
}

impl RecordedDocument {
    /// Returns the policy in force, if interactions are suppressed.
    #[must_use]
    pub fn suppression(&self) -> Option<ShortcutPolicy> {
        self.suppression
    }
}

impl DocumentHandle for RecordedDocument {
    fn suppress_interactions(&mut self, policy: ShortcutPolicy) {
        self.suppression = Some(policy);
    }

    fn release_interactions(&mut self) {
        self.suppression = None;
    }
}

/// A surface that keeps every view rendered on it.
///
/// The server renders into one of these and ships the final view to the
/// browser; tests use it to assert what a page showed.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    views: Vec<PageView>,
    document: RecordedDocument,
}

impl RecordingSurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view currently shown.
    #[must_use]
    pub fn current(&self) -> Option<&PageView> {
        self.views.last()
    }

    /// Returns every view rendered, oldest first.
    #[must_use]
    pub fn history(&self) -> &[PageView] {
        &self.views
    }

    /// Returns the recorded document state.
    #[must_use]
    pub fn document_state(&self) -> &RecordedDocument {
        &self.document
    }

    /// Consumes the surface, returning the view currently shown.
    #[must_use]
    pub fn into_current(mut self) -> PageView {
        self.views.pop().unwrap_or(PageView::Loading)
    }
}

impl RenderSurface for RecordingSurface {
    fn render(&mut self, view: PageView) {
        self.views.push(view);
    }

    fn players(&mut self) -> Vec<&mut dyn PlayerHandle> {
        match self.views.last_mut() {
            Some(view) => view
                .lessons_mut()
                .iter_mut()
                .map(|lesson| lesson as &mut dyn PlayerHandle)
                .collect(),
            None => Vec::new(),
        }
    }

    fn document(&mut self) -> &mut dyn DocumentHandle {
        &mut self.document
    }
}
