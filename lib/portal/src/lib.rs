//! Page sessions for lesson-gate.
//!
//! This crate provides:
//! - `SessionController`, which turns identity changes into rendered pages
//!   through the access gate and the content service
//! - `AdminCommand`, the messages admin row actions send to the controller
//! - `PageView` and the `RenderSurface` it is drawn on
//! - `PlaybackGuard`, best-effort restrictions on rendered players
//!
//! The crate has no async runtime dependency and builds for the browser as
//! well as the server, so both sides share the view types and the shortcut
//! policy.

pub mod command;
pub mod controller;
pub mod guard;
pub mod render;

pub use command::{AdminCommand, CommandError};
pub use controller::{IdentityChanged, Outcome, SessionContext, SessionController};
pub use guard::{DocumentHandle, KeyChord, PlaybackGuard, PlayerHandle, ShortcutPolicy};
pub use render::{
    Destination, LessonView, Notice, PageView, PlayerRestrictions, ProfileRow, RecordedDocument,
    RecordingSurface, RenderSurface, VideoRow,
};
