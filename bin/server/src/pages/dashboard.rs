//! Student dashboard: the lesson list.

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use lesson_gate_portal::{Notice, PageView};

use super::components::{GuardedDocument, LessonPlayer, NoticeBanner, PendingNotice, RedirectTo};

/// Server function that evaluates the dashboard for the signed-in identity.
#[server]
pub async fn load_dashboard() -> Result<PageView, ServerFnError> {
    use crate::server_helpers::{finished_view, render_area};
    use lesson_gate_platform_access::Area;

    let controller = render_area(Area::Dashboard).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to resolve session for dashboard");
        e.into_server_error()
    })?;

    Ok(finished_view(controller))
}

/// The dashboard page.
#[component]
pub fn DashboardPage() -> impl IntoView {
    let page = Resource::new(|| (), |_| load_dashboard());
    let query = use_query_map();
    let arrived_with = move || {
        query
            .with(|q| q.get("notice"))
            .and_then(|code| Notice::from_code(&code))
    };

    view! {
        <div class="dashboard-page">
            {move || arrived_with().map(|notice| view! { <NoticeBanner notice=notice/> })}
            <Suspense fallback=move || view! { <p>"Loading..."</p> }>
                {move || {
                    page.get().map(|result| match result {
                        Ok(view) => dashboard_view(view),
                        Err(_) => view! {
                            <NoticeBanner notice=Notice::StoreUnavailable/>
                        }.into_any(),
                    })
                }}
            </Suspense>
        </div>
    }
}

fn dashboard_view(page: PageView) -> AnyView {
    match page {
        PageView::Loading => view! { <p>"Loading..."</p> }.into_any(),
        PageView::Redirect { to, notice } => view! { <RedirectTo to=to notice=notice/> }.into_any(),
        PageView::Pending { name } => view! { <PendingNotice name=name/> }.into_any(),
        PageView::Unavailable { notice } => view! { <NoticeBanner notice=notice/> }.into_any(),
        PageView::Lessons {
            name,
            is_admin,
            lessons,
        } => view! {
            <GuardedDocument/>
            <header class="dashboard-header">
                <h1>{format!("Welcome, {}", name)}</h1>
                {is_admin.then(|| view! { <a href="/admin" class="admin-link">"Manage lessons"</a> })}
            </header>
            {if lessons.is_empty() {
                view! { <p class="empty-state">"No lessons yet."</p> }.into_any()
            } else {
                view! {
                    <div class="lessons">
                        {lessons.into_iter().map(|lesson| view! { <LessonPlayer lesson=lesson/> }).collect_view()}
                    </div>
                }.into_any()
            }}
        }
        .into_any(),
        PageView::Admin { .. } => view! { <leptos_router::components::Redirect path="/admin"/> }.into_any(),
    }
}
