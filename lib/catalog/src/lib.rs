//! Lesson catalog for lesson-gate.
//!
//! This crate provides:
//! - Video link resolution into embed descriptors (`resolve`, `EmbedDescriptor`)
//! - Lesson records and their ordering (`VideoRecord`)
//! - The content store collaborator and an in-memory implementation
//! - `ContentService`, the operations pages call to list and manage lessons
//!   and profiles
//!
//! # Example
//!
//! ```
//! use lesson_gate_catalog::{EmbedKind, resolve};
//!
//! let descriptor = resolve("https://youtu.be/dQw4w9WgXcQ");
//! assert_eq!(descriptor.kind(), EmbedKind::YouTube);
//! assert_eq!(
//!     descriptor.embed_url().as_deref(),
//!     Some("https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0&modestbranding=1"),
//! );
//! ```

pub mod error;
pub mod link;
pub mod memory;
pub mod service;
pub mod store;
pub mod video;

pub use error::ContentError;
pub use link::{EmbedDescriptor, EmbedKind, Presentation, resolve};
pub use memory::InMemoryContentStore;
pub use service::ContentService;
pub use store::ContentStore;
pub use video::{UNTITLED_LESSON, VideoRecord, sort_lessons};
