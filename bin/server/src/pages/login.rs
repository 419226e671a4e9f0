//! Sign-in entry page.

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use lesson_gate_portal::Notice;

use super::components::NoticeBanner;

/// Entry page; the sign-in itself happens at the identity provider.
///
/// Shows why the visitor ended up here: a rejected sign-in (`?error=`, the
/// provider's message as given) or a notice code from a redirect.
#[component]
pub fn LoginPage() -> impl IntoView {
    let query = use_query_map();
    let notice = move || {
        query.with(|q| {
            q.get("error")
                .map(|reason| Notice::SignInFailed { reason })
                .or_else(|| q.get("notice").and_then(|code| Notice::from_code(&code)))
        })
    };

    view! {
        <div class="login-page">
            <div class="login-box">
                <h1>"Sign in to your lessons"</h1>
                {move || notice().map(|notice| view! { <NoticeBanner notice=notice/> })}
                <p>"Sign in with your account to continue."</p>
                <a href="/auth/login" rel="external" class="login-button">"Sign in"</a>
            </div>
        </div>
    }
}
