//! The page-level session controller.
//!
//! One controller drives one page. It reacts to identity changes by asking
//! the access gate what the page may show, fetching content only for the
//! authorized modes, and drawing the result on its render surface.
//!
//! Every event takes the next generation number. An evaluation whose
//! generation is no longer current when it finishes is dropped without
//! rendering, so back-to-back events can never leave a stale page behind.
//! The generation check and the render happen under the same lock.

use lesson_gate_catalog::ContentService;
use lesson_gate_platform_access::{
    AccessGate, Area, Identity, IdentityProvider, Profile, ViewMode,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument, warn};

use crate::command::{AdminCommand, CommandError};
use crate::guard::PlaybackGuard;
use crate::render::{Destination, LessonView, Notice, PageView, ProfileRow, RenderSurface, VideoRow};

/// An identity change reported by the identity provider: sign-in, sign-out,
/// or a restored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityChanged(pub Option<Identity>);

/// Result of handling one event or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The pass rendered the page in this mode.
    Rendered(ViewMode),
    /// A newer event arrived first; nothing was rendered.
    Superseded,
}

/// State of the page a controller drives.
pub struct SessionContext<S> {
    area: Area,
    identity: Option<Identity>,
    profile: Option<Profile>,
    mode: Option<ViewMode>,
    guard_mounted: bool,
    surface: S,
}

impl<S: RenderSurface> SessionContext<S> {
    /// Creates the context of a page showing `area` on `surface`.
    #[must_use]
    pub fn new(area: Area, surface: S) -> Self {
        Self {
            area,
            identity: None,
            profile: None,
            mode: None,
            guard_mounted: false,
            surface,
        }
    }

    /// Returns the area, fixed when the page loaded.
    #[must_use]
    pub fn area(&self) -> Area {
        self.area
    }

    /// Returns the identity of the last rendered pass.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Returns the view mode of the last rendered pass.
    #[must_use]
    pub fn mode(&self) -> Option<ViewMode> {
        self.mode
    }

    /// Returns the render surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

/// A finished evaluation waiting to be committed.
struct Pass {
    identity: Option<Identity>,
    profile: Option<Profile>,
    mode: ViewMode,
    view: PageView,
}

/// Drives one page through identity changes and admin commands.
pub struct SessionController<S> {
    gate: AccessGate,
    content: ContentService,
    identity_provider: Arc<dyn IdentityProvider>,
    guard: PlaybackGuard,
    generation: AtomicU64,
    context: Mutex<SessionContext<S>>,
}

impl<S: RenderSurface> SessionController<S> {
    /// Creates a controller for a page showing `area`.
    #[must_use]
    pub fn new(
        area: Area,
        gate: AccessGate,
        content: ContentService,
        identity_provider: Arc<dyn IdentityProvider>,
        surface: S,
    ) -> Self {
        Self {
            gate,
            content,
            identity_provider,
            guard: PlaybackGuard::new(),
            generation: AtomicU64::new(0),
            context: Mutex::new(SessionContext::new(area, surface)),
        }
    }

    /// Returns the area this controller renders.
    #[must_use]
    pub fn area(&self) -> Area {
        self.lock().area
    }

    /// Returns the view mode of the last rendered pass.
    #[must_use]
    pub fn mode(&self) -> Option<ViewMode> {
        self.lock().mode
    }

    /// Runs `f` against the page context.
    pub fn with_context<R>(&self, f: impl FnOnce(&SessionContext<S>) -> R) -> R {
        f(&self.lock())
    }

    /// Consumes the controller, returning its render surface.
    #[must_use]
    pub fn into_surface(self) -> S {
        self.context
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .surface
    }

    /// Handles an identity change.
    ///
    /// Failures never escape: a store failure renders a notice, and a
    /// missing profile signs the identity out and redirects.
    #[instrument(
        skip(self, event),
        fields(identity_id = event.0.as_ref().map(|i| i.id().as_str()))
    )]
    pub async fn handle(&self, event: IdentityChanged) -> Outcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let IdentityChanged(identity) = event;
        let area = self.area();

        let Some(pass) = self.evaluate(identity, area, generation).await else {
            return Outcome::Superseded;
        };
        self.commit(generation, pass)
    }

    /// Dispatches an admin command, then re-lists both management lists.
    ///
    /// A failed mutation is reported as a notice above the fresh lists.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::NotPermitted` unless the last rendered pass was
    /// in `AuthorizedAdmin` mode.
    #[instrument(skip(self, command), fields(command = command.name()))]
    pub async fn dispatch(
        &self,
        command: AdminCommand,
    ) -> lesson_gate_core::Result<Outcome, CommandError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let (mode, identity, profile) = {
            let ctx = self.lock();
            (ctx.mode, ctx.identity.clone(), ctx.profile.clone())
        };
        if mode != Some(ViewMode::AuthorizedAdmin) {
            warn!(mode = ?mode, "rejected admin command outside admin mode");
            return Err(CommandError::NotPermitted { mode }.into());
        }

        let result = match &command {
            AdminCommand::Authorize { id } => self.content.set_authorized(id, true).await,
            AdminCommand::Revoke { id } => self.content.set_authorized(id, false).await,
            AdminCommand::RemoveVideo { id } => self.content.remove_video(*id).await,
            AdminCommand::AddVideo { title, source_url } => self
                .content
                .add_video(title.clone(), source_url)
                .await
                .map(|_| ()),
        };
        let notice = match result {
            Ok(()) => {
                info!("admin command applied");
                None
            }
            Err(e) => {
                warn!(error = %e, "admin command failed");
                Some(Notice::ActionFailed {
                    message: command.failure_message().to_string(),
                })
            }
        };

        let name = profile.as_ref().map_or_else(String::new, |p| p.label().to_string());
        let view = self.admin_view(name, notice).await;
        Ok(self.commit(
            generation,
            Pass {
                identity,
                profile,
                mode: ViewMode::AuthorizedAdmin,
                view,
            },
        ))
    }

    fn lock(&self) -> MutexGuard<'_, SessionContext<S>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn evaluate(
        &self,
        identity: Option<Identity>,
        area: Area,
        generation: u64,
    ) -> Option<Pass> {
        let decision = match self.gate.evaluate(identity.as_ref(), area).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(error = %e, "profile read failed; treating page as unauthenticated");
                return Some(Pass {
                    identity,
                    profile: None,
                    mode: ViewMode::Unauthenticated,
                    view: PageView::Redirect {
                        to: Destination::Entry,
                        notice: Some(Notice::StoreUnavailable),
                    },
                });
            }
        };

        // Bail out before signing anyone out or fetching content for an
        // identity that is no longer current.
        if !self.is_current(generation) {
            debug!(generation, "evaluation superseded before render");
            return None;
        }

        let mode = decision.mode();
        let profile = decision.profile().cloned();
        let name = profile.as_ref().map_or_else(String::new, |p| p.label().to_string());

        let view = if decision.missing_profile().is_some() {
            self.force_sign_out(identity.as_ref()).await;
            PageView::Redirect {
                to: Destination::Entry,
                notice: Some(Notice::ProfileMissing),
            }
        } else {
            match mode {
                ViewMode::Unauthenticated => PageView::Redirect {
                    to: Destination::Entry,
                    notice: None,
                },
                ViewMode::PendingAuthorization => PageView::Pending { name },
                ViewMode::DeniedAdminArea => PageView::Redirect {
                    to: Destination::Dashboard,
                    notice: Some(Notice::AccessDenied),
                },
                ViewMode::AuthorizedStudent => {
                    let is_admin = profile.as_ref().is_some_and(|p| p.role().is_admin());
                    self.lessons_view(name, is_admin).await
                }
                ViewMode::AuthorizedAdmin => self.admin_view(name, None).await,
            }
        };

        Some(Pass {
            identity,
            profile,
            mode,
            view,
        })
    }

    async fn force_sign_out(&self, identity: Option<&Identity>) {
        let Some(identity) = identity else {
            return;
        };
        warn!(identity_id = %identity.id(), "signing out identity without a profile");
        if let Err(e) = self.identity_provider.sign_out(identity).await {
            error!(identity_id = %identity.id(), error = %e, "forced sign-out failed");
        }
    }

    async fn lessons_view(&self, name: String, is_admin: bool) -> PageView {
        match self.content.list_videos().await {
            Ok(videos) => PageView::Lessons {
                name,
                is_admin,
                lessons: videos.iter().map(LessonView::from).collect(),
            },
            Err(e) => {
                error!(error = %e, "failed to load lessons");
                PageView::Unavailable {
                    notice: Notice::StoreUnavailable,
                }
            }
        }
    }

    async fn admin_view(&self, name: String, notice: Option<Notice>) -> PageView {
        let profiles = match self.content.list_profiles().await {
            Ok(profiles) => profiles,
            Err(e) => {
                error!(error = %e, "failed to load profiles");
                return PageView::Unavailable {
                    notice: Notice::StoreUnavailable,
                };
            }
        };
        let videos = match self.content.list_videos().await {
            Ok(videos) => videos,
            Err(e) => {
                error!(error = %e, "failed to load lessons");
                return PageView::Unavailable {
                    notice: Notice::StoreUnavailable,
                };
            }
        };

        PageView::Admin {
            name,
            profiles: profiles.iter().map(ProfileRow::from).collect(),
            videos: videos.iter().map(VideoRow::from).collect(),
            notice,
        }
    }

    fn commit(&self, generation: u64, pass: Pass) -> Outcome {
        let mut locked = self.lock();
        let ctx = &mut *locked;

        if !self.is_current(generation) {
            warn!(generation, mode = %pass.mode, "discarding stale evaluation");
            return Outcome::Superseded;
        }

        let shows_lessons = matches!(pass.view, PageView::Lessons { .. });
        ctx.identity = pass.identity;
        ctx.profile = pass.profile;
        ctx.mode = Some(pass.mode);
        ctx.surface.render(pass.view);

        if shows_lessons {
            for player in ctx.surface.players() {
                self.guard.protect(player);
            }
            self.guard.mount(ctx.surface.document());
            ctx.guard_mounted = true;
        } else if ctx.guard_mounted {
            self.guard.unmount(ctx.surface.document());
            ctx.guard_mounted = false;
        }

        debug!(generation, mode = %pass.mode, "rendered");
        Outcome::Rendered(pass.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingSurface;
    use async_trait::async_trait;
    use lesson_gate_catalog::{
        ContentError, ContentStore, InMemoryContentStore, Presentation, VideoRecord,
    };
    use lesson_gate_core::VideoId;
    use lesson_gate_platform_access::{
        AuthenticationError, IdentityId, InMemoryProfileStore, ProfilePatch, ProfileStore, Role,
        StoreError,
    };
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingIdentityProvider {
        signed_out: Mutex<Vec<IdentityId>>,
    }

    impl RecordingIdentityProvider {
        fn signed_out(&self) -> Vec<IdentityId> {
            self.signed_out.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentityProvider for RecordingIdentityProvider {
        async fn sign_out(&self, identity: &Identity) -> Result<(), AuthenticationError> {
            self.signed_out.lock().unwrap().push(identity.id().clone());
            Ok(())
        }
    }

    /// Counts list calls so tests can assert content was never fetched.
    #[derive(Default)]
    struct CountingContentStore {
        inner: InMemoryContentStore,
        lists: AtomicUsize,
        fail: bool,
    }

    impl CountingContentStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn lists(&self) -> usize {
            self.lists.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentStore for CountingContentStore {
        async fn list_videos(&self) -> Result<Vec<VideoRecord>, ContentError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ContentError::StoreUnavailable {
                    details: "quota exceeded".to_string(),
                });
            }
            self.inner.list_videos().await
        }

        async fn add_video(&self, record: VideoRecord) -> Result<VideoId, ContentError> {
            self.inner.add_video(record).await
        }

        async fn delete_video(&self, id: VideoId) -> Result<(), ContentError> {
            self.inner.delete_video(id).await
        }
    }

    /// Holds profile reads for one identity until released.
    struct DelayedProfileStore {
        inner: InMemoryProfileStore,
        held: IdentityId,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ProfileStore for DelayedProfileStore {
        async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>, StoreError> {
            if id == &self.held {
                self.release.notified().await;
            }
            self.inner.get_profile(id).await
        }

        async fn set_profile(&self, id: &IdentityId, patch: ProfilePatch) -> Result<(), StoreError> {
            self.inner.set_profile(id, patch).await
        }

        async fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
            self.inner.find_profile_by_email(email).await
        }

        async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
            self.inner.list_profiles().await
        }

        async fn provision(
            &self,
            identity: &Identity,
            display_name: Option<String>,
            role: Role,
        ) -> Result<(Profile, bool), StoreError> {
            self.inner.provision(identity, display_name, role).await
        }
    }

    /// Fails every profile read as if the backing store were down.
    struct UnavailableProfileStore;

    impl UnavailableProfileStore {
        fn down() -> StoreError {
            StoreError::Unavailable {
                details: "connection refused".to_string(),
            }
        }
    }

    #[async_trait]
    impl ProfileStore for UnavailableProfileStore {
        async fn get_profile(&self, _id: &IdentityId) -> Result<Option<Profile>, StoreError> {
            Err(Self::down())
        }

        async fn set_profile(&self, _id: &IdentityId, _patch: ProfilePatch) -> Result<(), StoreError> {
            Err(Self::down())
        }

        async fn find_profile_by_email(&self, _email: &str) -> Result<Option<Profile>, StoreError> {
            Err(Self::down())
        }

        async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
            Err(Self::down())
        }

        async fn provision(
            &self,
            _identity: &Identity,
            _display_name: Option<String>,
            _role: Role,
        ) -> Result<(Profile, bool), StoreError> {
            Err(Self::down())
        }
    }

    struct Fixture {
        profiles: Arc<InMemoryProfileStore>,
        videos: Arc<CountingContentStore>,
        provider: Arc<RecordingIdentityProvider>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_videos(CountingContentStore::default())
        }

        fn with_videos(videos: CountingContentStore) -> Self {
            Self {
                profiles: Arc::new(InMemoryProfileStore::new()),
                videos: Arc::new(videos),
                provider: Arc::new(RecordingIdentityProvider::default()),
            }
        }

        fn person(&self, id: &str, role: Role, authorized: bool) -> Identity {
            let identity = Identity::new(id, format!("{id}@example.com"));
            let mut profile = Profile::new(&identity, Some(id.to_uppercase()), role);
            profile.apply(&ProfilePatch::authorized(authorized));
            self.profiles.insert(&profile);
            identity
        }

        fn controller_with(
            &self,
            area: Area,
            profiles: Arc<dyn ProfileStore>,
        ) -> SessionController<RecordingSurface> {
            SessionController::new(
                area,
                AccessGate::new(profiles.clone()),
                ContentService::new(self.videos.clone(), profiles),
                self.provider.clone(),
                RecordingSurface::new(),
            )
        }

        fn controller(&self, area: Area) -> SessionController<RecordingSurface> {
            self.controller_with(area, self.profiles.clone())
        }

        async fn add_video(&self, url: &str) {
            self.videos
                .add_video(VideoRecord::new(None, url))
                .await
                .unwrap();
        }
    }

    fn current(controller: &SessionController<RecordingSurface>) -> PageView {
        controller.with_context(|ctx| ctx.surface().current().cloned().unwrap())
    }

    #[tokio::test]
    async fn anonymous_is_redirected_to_entry() {
        let fx = Fixture::new();
        let controller = fx.controller(Area::Dashboard);

        let outcome = controller.handle(IdentityChanged(None)).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::Unauthenticated));
        assert_eq!(
            current(&controller),
            PageView::Redirect {
                to: Destination::Entry,
                notice: None
            }
        );
        assert_eq!(fx.videos.lists(), 0);
    }

    #[tokio::test]
    async fn pending_student_never_fetches_content() {
        let fx = Fixture::new();
        fx.add_video("https://youtu.be/dQw4w9WgXcQ").await;
        let identity = fx.person("pat", Role::User, false);
        let controller = fx.controller(Area::Dashboard);

        let outcome = controller.handle(IdentityChanged(Some(identity))).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::PendingAuthorization));
        assert_eq!(
            current(&controller),
            PageView::Pending {
                name: "PAT".to_string()
            }
        );
        assert_eq!(fx.videos.lists(), 0);
    }

    #[tokio::test]
    async fn authorized_student_sees_guarded_lessons_in_order() {
        let fx = Fixture::new();
        fx.add_video("https://cdn.example.com/01.mp4").await;
        fx.add_video("https://youtu.be/dQw4w9WgXcQ").await;
        fx.add_video("https://mega.nz/file/abc#key").await;
        let identity = fx.person("sam", Role::User, true);
        let controller = fx.controller(Area::Dashboard);

        controller.handle(IdentityChanged(Some(identity))).await;

        let PageView::Lessons { lessons, is_admin, .. } = current(&controller) else {
            panic!("expected lessons");
        };
        assert!(!is_admin);
        let presentations: Vec<_> = lessons.iter().map(|l| l.presentation).collect();
        assert_eq!(
            presentations,
            vec![
                Presentation::NativePlayer,
                Presentation::Frame,
                Presentation::ExternalLink
            ]
        );
        assert!(lessons[0].restrictions.overlay);
        assert!(lessons[0].restrictions.no_download);
        assert!(lessons[0].restrictions.no_picture_in_picture);
        assert!(lessons[1].restrictions.overlay);
        assert!(!lessons[2].restrictions.overlay);
        controller.with_context(|ctx| {
            assert!(ctx.surface().document_state().suppression().is_some());
        });
    }

    #[tokio::test]
    async fn missing_profile_forces_sign_out() {
        let fx = Fixture::new();
        let ghost = Identity::new("ghost", "ghost@example.com");
        let controller = fx.controller(Area::Dashboard);

        let outcome = controller.handle(IdentityChanged(Some(ghost))).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::Unauthenticated));
        assert_eq!(
            current(&controller),
            PageView::Redirect {
                to: Destination::Entry,
                notice: Some(Notice::ProfileMissing)
            }
        );
        assert_eq!(fx.provider.signed_out(), vec![IdentityId::new("ghost")]);
        assert_eq!(fx.videos.lists(), 0);
    }

    #[tokio::test]
    async fn student_in_admin_area_is_sent_to_dashboard() {
        let fx = Fixture::new();
        let identity = fx.person("stu", Role::User, true);
        let controller = fx.controller(Area::Admin);

        controller.handle(IdentityChanged(Some(identity))).await;

        assert_eq!(
            current(&controller),
            PageView::Redirect {
                to: Destination::Dashboard,
                notice: Some(Notice::AccessDenied)
            }
        );
        assert_eq!(fx.videos.lists(), 0);
    }

    #[tokio::test]
    async fn admin_sees_both_lists() {
        let fx = Fixture::new();
        fx.person("old", Role::User, false);
        fx.add_video("https://youtu.be/dQw4w9WgXcQ").await;
        let admin = fx.person("adm", Role::Admin, false);
        let controller = fx.controller(Area::Admin);

        let outcome = controller.handle(IdentityChanged(Some(admin))).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::AuthorizedAdmin));
        let PageView::Admin {
            profiles, videos, ..
        } = current(&controller)
        else {
            panic!("expected admin view");
        };
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].identity_id, "adm");
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn admin_lists_survive_a_malformed_profile_document() {
        let fx = Fixture::new();
        let student = fx.person("stu", Role::User, false);
        fx.profiles.insert_document(
            IdentityId::new("legacy"),
            serde_json::json!({ "uid": "legacy", "email": "legacy@example.com" }),
        );
        let admin = fx.person("adm", Role::Admin, false);
        let controller = fx.controller(Area::Admin);

        let outcome = controller.handle(IdentityChanged(Some(admin))).await;
        assert_eq!(outcome, Outcome::Rendered(ViewMode::AuthorizedAdmin));
        let PageView::Admin { profiles, .. } = current(&controller) else {
            panic!("expected admin view");
        };
        let ids: Vec<_> = profiles.iter().map(|p| p.identity_id.as_str()).collect();
        assert!(ids.contains(&"adm"));
        assert!(ids.contains(&"stu"));
        assert!(!ids.contains(&"legacy"));

        controller
            .dispatch(AdminCommand::Authorize {
                id: student.id().clone(),
            })
            .await
            .unwrap();
        let PageView::Admin { profiles, .. } = current(&controller) else {
            panic!("expected admin view after authorizing");
        };
        let stu = profiles.iter().find(|p| p.identity_id == "stu").unwrap();
        assert!(stu.authorized);
    }

    #[tokio::test]
    async fn profile_store_failure_renders_unauthenticated_with_notice() {
        let fx = Fixture::new();
        fx.add_video("https://youtu.be/dQw4w9WgXcQ").await;
        let identity = Identity::new("sam", "sam@example.com");
        let controller = fx.controller_with(Area::Dashboard, Arc::new(UnavailableProfileStore));

        let outcome = controller.handle(IdentityChanged(Some(identity))).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::Unauthenticated));
        assert_eq!(
            current(&controller),
            PageView::Redirect {
                to: Destination::Entry,
                notice: Some(Notice::StoreUnavailable)
            }
        );
        assert_eq!(fx.videos.lists(), 0);
        assert!(fx.provider.signed_out().is_empty());
        controller.with_context(|ctx| {
            assert!(ctx.surface().document_state().suppression().is_none());
        });
    }

    #[tokio::test]
    async fn content_failure_renders_terminal_notice() {
        let fx = Fixture::with_videos(CountingContentStore::failing());
        let identity = fx.person("sam", Role::User, true);
        let controller = fx.controller(Area::Dashboard);

        let outcome = controller.handle(IdentityChanged(Some(identity))).await;

        assert_eq!(outcome, Outcome::Rendered(ViewMode::AuthorizedStudent));
        assert_eq!(
            current(&controller),
            PageView::Unavailable {
                notice: Notice::StoreUnavailable
            }
        );
        controller.with_context(|ctx| {
            assert!(ctx.surface().document_state().suppression().is_none());
        });
    }

    #[tokio::test]
    async fn only_the_newest_event_renders() {
        let fx = Fixture::new();
        fx.add_video("https://youtu.be/dQw4w9WgXcQ").await;
        let first = fx.person("alice", Role::User, true);
        let second = fx.person("bob", Role::User, false);
        let release = Arc::new(Notify::new());
        let delayed = Arc::new(DelayedProfileStore {
            inner: InMemoryProfileStore::new(),
            held: first.id().clone(),
            release: release.clone(),
        });
        for id in ["alice", "bob"] {
            let profile = fx
                .profiles
                .get_profile(&IdentityId::new(id))
                .await
                .unwrap()
                .unwrap();
            delayed.inner.insert(&profile);
        }
        let controller = fx.controller_with(Area::Dashboard, delayed);

        let (a, b) = tokio::join!(
            controller.handle(IdentityChanged(Some(first))),
            async {
                let outcome = controller.handle(IdentityChanged(Some(second))).await;
                release.notify_one();
                outcome
            }
        );

        assert_eq!(a, Outcome::Superseded);
        assert_eq!(b, Outcome::Rendered(ViewMode::PendingAuthorization));
        assert_eq!(controller.mode(), Some(ViewMode::PendingAuthorization));
        controller.with_context(|ctx| {
            assert_eq!(ctx.surface().history().len(), 1);
            assert_eq!(ctx.identity().map(|i| i.id().as_str()), Some("bob"));
        });
        assert_eq!(fx.videos.lists(), 0);
    }

    #[tokio::test]
    async fn sign_out_supersedes_pending_sign_in() {
        let fx = Fixture::new();
        let first = fx.person("alice", Role::Admin, true);
        let release = Arc::new(Notify::new());
        let delayed = Arc::new(DelayedProfileStore {
            inner: InMemoryProfileStore::new(),
            held: first.id().clone(),
            release: release.clone(),
        });
        let profile = fx.profiles.get_profile(first.id()).await.unwrap().unwrap();
        delayed.inner.insert(&profile);
        let controller = fx.controller_with(Area::Admin, delayed);

        let (a, b) = tokio::join!(
            controller.handle(IdentityChanged(Some(first))),
            async {
                let outcome = controller.handle(IdentityChanged(None)).await;
                release.notify_one();
                outcome
            }
        );

        assert_eq!(a, Outcome::Superseded);
        assert_eq!(b, Outcome::Rendered(ViewMode::Unauthenticated));
        assert!(matches!(
            current(&controller),
            PageView::Redirect {
                to: Destination::Entry,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn guard_is_unmounted_when_access_is_revoked() {
        let fx = Fixture::new();
        fx.add_video("https://cdn.example.com/01.mp4").await;
        let identity = fx.person("sam", Role::User, true);
        let controller = fx.controller(Area::Dashboard);
        controller
            .handle(IdentityChanged(Some(identity.clone())))
            .await;

        fx.profiles
            .set_profile(identity.id(), ProfilePatch::authorized(false))
            .await
            .unwrap();
        controller.handle(IdentityChanged(Some(identity))).await;

        assert_eq!(controller.mode(), Some(ViewMode::PendingAuthorization));
        controller.with_context(|ctx| {
            assert!(ctx.surface().document_state().suppression().is_none());
        });
    }

    #[tokio::test]
    async fn commands_are_rejected_outside_admin_mode() {
        let fx = Fixture::new();
        let identity = fx.person("sam", Role::User, true);
        let controller = fx.controller(Area::Dashboard);
        controller.handle(IdentityChanged(Some(identity.clone()))).await;

        let err = controller
            .dispatch(AdminCommand::Authorize {
                id: identity.id().clone(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authorized_student"));
    }

    #[tokio::test]
    async fn authorize_then_relist() {
        let fx = Fixture::new();
        let student = fx.person("stu", Role::User, false);
        let admin = fx.person("adm", Role::Admin, false);
        let controller = fx.controller(Area::Admin);
        controller.handle(IdentityChanged(Some(admin))).await;

        let outcome = controller
            .dispatch(AdminCommand::Authorize {
                id: student.id().clone(),
            })
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Rendered(ViewMode::AuthorizedAdmin));
        let PageView::Admin {
            profiles, notice, ..
        } = current(&controller)
        else {
            panic!("expected admin view");
        };
        assert_eq!(notice, None);
        let row = profiles.iter().find(|p| p.identity_id == "stu").unwrap();
        assert!(row.authorized);
    }

    #[tokio::test]
    async fn add_and_remove_video_relist() {
        let fx = Fixture::new();
        let admin = fx.person("adm", Role::Admin, false);
        let controller = fx.controller(Area::Admin);
        controller.handle(IdentityChanged(Some(admin))).await;

        controller
            .dispatch(AdminCommand::AddVideo {
                title: Some("Intro".to_string()),
                source_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            })
            .await
            .unwrap();
        let PageView::Admin { videos, .. } = current(&controller) else {
            panic!("expected admin view");
        };
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].title, "Intro");

        let id: VideoId = videos[0].id.parse().unwrap();
        controller
            .dispatch(AdminCommand::RemoveVideo { id })
            .await
            .unwrap();
        let PageView::Admin { videos, .. } = current(&controller) else {
            panic!("expected admin view");
        };
        assert!(videos.is_empty());
    }

    #[tokio::test]
    async fn failed_command_shows_notice_above_fresh_lists() {
        let fx = Fixture::new();
        let admin = fx.person("adm", Role::Admin, false);
        let controller = fx.controller(Area::Admin);
        controller.handle(IdentityChanged(Some(admin))).await;

        controller
            .dispatch(AdminCommand::Revoke {
                id: IdentityId::new("gone"),
            })
            .await
            .unwrap();

        let PageView::Admin {
            notice, profiles, ..
        } = current(&controller)
        else {
            panic!("expected admin view");
        };
        assert_eq!(
            notice.map(|n| n.text().to_string()),
            Some("Could not revoke access.".to_string())
        );
        assert_eq!(profiles.len(), 1);
    }
}
