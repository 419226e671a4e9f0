//! The access gate: decides what an identity may see on a page.
//!
//! The gate is a decision function over observed state. Its only effect is
//! the profile read; signing out, redirecting and notices are left to the
//! caller, which keeps the gate testable without a UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::error::{AccessError, StoreError};
use crate::identity::Identity;
use crate::profile::Profile;
use crate::store::ProfileStore;

/// The area a page renders, fixed when the page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// The student lesson dashboard.
    Dashboard,
    /// The admin management area.
    Admin,
}

impl Area {
    /// Returns the area name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the current page is allowed to render.
///
/// Derived fresh on every identity change; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// No identity, or no usable profile.
    Unauthenticated,
    /// Registered student still waiting for an admin.
    PendingAuthorization,
    /// Student (or admin) allowed to watch lessons.
    AuthorizedStudent,
    /// Admin inside the admin area.
    AuthorizedAdmin,
    /// Non-admin asking for the admin area.
    DeniedAdminArea,
}

impl ViewMode {
    /// Returns the mode name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PendingAuthorization => "pending_authorization",
            Self::AuthorizedStudent => "authorized_student",
            Self::AuthorizedAdmin => "authorized_admin",
            Self::DeniedAdminArea => "denied_admin_area",
        }
    }

    /// Returns true for the modes that render content.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedStudent | Self::AuthorizedAdmin)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    mode: ViewMode,
    profile: Option<Profile>,
    missing_profile: Option<AccessError>,
}

impl GateDecision {
    fn anonymous() -> Self {
        Self {
            mode: ViewMode::Unauthenticated,
            profile: None,
            missing_profile: None,
        }
    }

    /// Returns the derived view mode.
    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Returns the profile that was read, if any.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Returns the `ProfileMissing` condition when an authenticated identity
    /// had no usable profile. The caller must sign that identity out.
    #[must_use]
    pub fn missing_profile(&self) -> Option<&AccessError> {
        self.missing_profile.as_ref()
    }
}

/// Computes view modes from identities and stored profiles.
#[derive(Clone)]
pub struct AccessGate {
    profiles: Arc<dyn ProfileStore>,
}

impl AccessGate {
    /// Creates a gate reading from the given profile store.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    /// Returns the underlying profile store.
    #[must_use]
    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Decides what `identity` may see in `area`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the profile read fails. The
    /// read is not retried.
    #[instrument(skip(self, identity), fields(identity_id = identity.map(|i| i.id().as_str())))]
    pub async fn evaluate(
        &self,
        identity: Option<&Identity>,
        area: Area,
    ) -> lesson_gate_core::Result<GateDecision, AccessError> {
        let Some(identity) = identity else {
            debug!(mode = %ViewMode::Unauthenticated, "no identity");
            return Ok(GateDecision::anonymous());
        };

        let profile = match self.profiles.get_profile(identity.id()).await {
            Ok(Some(profile)) => profile,
            Ok(None) => return Ok(Self::missing(identity, "no profile record")),
            Err(StoreError::InvalidRecord { reason, .. }) => {
                return Ok(Self::missing(identity, &reason));
            }
            Err(e) => return Err(AccessError::from(e).into()),
        };

        let mode = decide(&profile, area);
        debug!(mode = %mode, role = %profile.role(), "gate decision");

        Ok(GateDecision {
            mode,
            profile: Some(profile),
            missing_profile: None,
        })
    }

    fn missing(identity: &Identity, reason: &str) -> GateDecision {
        warn!(identity_id = %identity.id(), reason, "authenticated identity has no usable profile");
        GateDecision {
            mode: ViewMode::Unauthenticated,
            profile: None,
            missing_profile: Some(AccessError::ProfileMissing {
                identity_id: identity.id().clone(),
            }),
        }
    }
}

/// The decision table for an identity that has a profile.
#[must_use]
pub fn decide(profile: &Profile, area: Area) -> ViewMode {
    match area {
        Area::Admin if profile.role().is_admin() => ViewMode::AuthorizedAdmin,
        Area::Admin => ViewMode::DeniedAdminArea,
        Area::Dashboard if profile.may_watch() => ViewMode::AuthorizedStudent,
        Area::Dashboard => ViewMode::PendingAuthorization,
    }
}
