//! Components shared by the lesson and admin pages.

use leptos::ev;
use leptos::prelude::*;
use leptos_router::components::Redirect;
use lesson_gate_catalog::Presentation;
use lesson_gate_portal::{
    Destination, KeyChord, LessonView, Notice, PlaybackGuard, ShortcutPolicy,
};

/// A one-line notice.
#[component]
pub fn NoticeBanner(notice: Notice) -> impl IntoView {
    let class = match notice {
        Notice::ActionFailed { .. } | Notice::StoreUnavailable => "notice notice-error",
        _ => "notice",
    };
    view! { <p class=class role="status">{notice.text().to_string()}</p> }
}

/// Navigates away, carrying the notice to the destination page.
#[component]
pub fn RedirectTo(to: Destination, notice: Option<Notice>) -> impl IntoView {
    let location = to.location(notice.as_ref());
    view! { <Redirect path=location/> }
}

/// Shown to a signed-in student whose profile is not authorized yet.
#[component]
pub fn PendingNotice(name: String) -> impl IntoView {
    view! {
        <div class="pending">
            <h1>{format!("Welcome, {}", name)}</h1>
            <p>"Your account is waiting for approval. You will see your lessons here once an administrator authorizes it."</p>
            <a href="/auth/logout" rel="external">"Sign out"</a>
        </div>
    }
}

/// One lesson with its player.
///
/// Guarded players start behind an overlay that swallows the first click;
/// the click removes it and the player's own controls take over.
#[component]
pub fn LessonPlayer(lesson: LessonView) -> impl IntoView {
    let title = lesson.title.clone();
    let lesson = RwSignal::new(lesson);
    let overlay = move || lesson.with(|l| l.restrictions.overlay);
    let dismiss = move |_| lesson.update(|l| PlaybackGuard::new().dismiss(l));

    let player = lesson.with_untracked(|l| {
        let src = l.embed_url.clone().unwrap_or_default();
        match l.presentation {
            Presentation::Frame => view! {
                <iframe
                    src=src
                    title=l.title.clone()
                    allow="autoplay; encrypted-media; fullscreen"
                    allowfullscreen=true
                    referrerpolicy="strict-origin-when-cross-origin"
                ></iframe>
            }
            .into_any(),
            Presentation::NativePlayer => {
                let controlslist = l.restrictions.no_download.then_some("nodownload");
                view! {
                    <video
                        src=src
                        controls=true
                        preload="metadata"
                        disablepictureinpicture=l.restrictions.no_picture_in_picture
                        controlslist=controlslist
                    ></video>
                }
                .into_any()
            }
            Presentation::ExternalLink => view! {
                <a href=src target="_blank" rel="noopener noreferrer" class="lesson-external">
                    "Open lesson"
                </a>
            }
            .into_any(),
            Presentation::Notice => view! {
                <p class="lesson-unsupported">"This lesson link cannot be played here."</p>
            }
            .into_any(),
        }
    });

    view! {
        <article class="lesson">
            <h2>{title}</h2>
            <div class="player">
                {player}
                <Show when=overlay>
                    <div class="player-overlay" on:click=dismiss>
                        <span>"Click to play"</span>
                    </div>
                </Show>
            </div>
        </article>
    }
}

/// Suppresses the context menu, drag start, and the shortcut table for as
/// long as it is mounted.
///
/// Deterrence only; it does not protect the media.
#[component]
pub fn GuardedDocument() -> impl IntoView {
    Effect::new(move || {
        let policy = ShortcutPolicy;
        let keys = window_event_listener(ev::keydown, move |event| {
            let chord = KeyChord::new(event.key())
                .with_ctrl(event.ctrl_key())
                .with_shift(event.shift_key());
            if policy.suppresses(&chord) {
                event.prevent_default();
                event.stop_propagation();
            }
        });
        let menu = window_event_listener(ev::contextmenu, |event| event.prevent_default());
        let drag = window_event_listener(ev::dragstart, |event| event.prevent_default());

        on_cleanup(move || {
            keys.remove();
            menu.remove();
            drag.remove();
        });
    });
}
