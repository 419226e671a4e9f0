//! PostgreSQL repositories for the lesson-gate server.
//!
//! This module provides the database-backed implementations of:
//! - [`ProfileStore`](lesson_gate_platform_access::ProfileStore) for profiles
//! - [`ContentStore`](lesson_gate_catalog::ContentStore) for lesson videos

pub mod profile;
pub mod video;

pub use profile::PgProfileStore;
pub use video::PgContentStore;
