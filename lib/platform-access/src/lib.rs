//! Identities, profiles, and access decisions for lesson-gate.
//!
//! This crate provides:
//! - Identities issued by the external provider (`Identity`, `IdentityId`)
//! - Persisted authorization state (`Profile`, `ProfileStore`)
//! - The access gate that maps an identity and a page area to a `ViewMode`
//! - Sign-in sessions and OIDC configuration
//!
//! # Access Control Model
//!
//! Signing in only proves who the caller is. Every profile starts with
//! `authorized = false`; an admin must authorize it before the student can
//! watch lessons. Admins pass the gate in both areas regardless of the flag.
//!
//! # Example
//!
//! ```
//! use lesson_gate_platform_access::{Area, Identity, Profile, Role, ViewMode, decide};
//!
//! let identity = Identity::new("auth0|123456", "alice@example.com");
//! let profile = Profile::new(&identity, Some("Alice".to_string()), Role::User);
//!
//! assert_eq!(decide(&profile, Area::Dashboard), ViewMode::PendingAuthorization);
//! assert_eq!(decide(&profile, Area::Admin), ViewMode::DeniedAdminArea);
//! ```

pub mod auth;
pub mod error;
pub mod gate;
pub mod identity;
pub mod memory;
pub mod oidc;
pub mod profile;
pub mod role;
pub mod session;
pub mod store;

// Re-export main types at crate root
pub use auth::{OidcClaims, Registration, register_profile};
pub use error::{AccessError, AuthenticationError, StoreError};
pub use gate::{AccessGate, Area, GateDecision, ViewMode, decide};
pub use identity::{Identity, IdentityId, IdentityProvider};
pub use memory::InMemoryProfileStore;
pub use oidc::OidcConfig;
pub use profile::{Profile, ProfilePatch, normalize_email};
pub use role::{Role, UnknownRole};
pub use session::{Session, SessionId};
pub use store::ProfileStore;
