//! Core domain types and utilities for the lesson-gate platform.
//!
//! This crate provides the foundational identifier types and the shared
//! error-handling alias used by every other crate in the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, VideoId};
