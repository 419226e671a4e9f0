//! Admin page component and server functions.
//!
//! Every admin request re-evaluates the access gate before touching data, so
//! a revoked admin cannot act from a page loaded earlier.

use leptos::prelude::*;
use leptos::server_fn::codec::Json;
use leptos_router::components::Redirect;
use lesson_gate_core::VideoId;
use lesson_gate_platform_access::IdentityId;
use lesson_gate_portal::{AdminCommand, Notice, PageView, ProfileRow, VideoRow};

use super::components::{NoticeBanner, RedirectTo};

/// Server function that evaluates the admin area for the signed-in identity.
#[server]
pub async fn load_admin() -> Result<PageView, ServerFnError> {
    use crate::server_helpers::{finished_view, render_area};
    use lesson_gate_platform_access::Area;

    let controller = render_area(Area::Admin).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to resolve session for admin page");
        e.into_server_error()
    })?;

    Ok(finished_view(controller))
}

/// Server function to run an admin action and return the refreshed lists.
#[server(input = Json)]
pub async fn run_admin_command(command: AdminCommand) -> Result<PageView, ServerFnError> {
    use crate::error::AdminError;
    use crate::server_helpers::{finished_view, render_area};
    use lesson_gate_platform_access::Area;

    let controller = render_area(Area::Admin).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to resolve session for admin command");
        e.into_server_error()
    })?;

    let name = command.name();
    controller.dispatch(command).await.map_err(|e| {
        tracing::debug!(error = %e, command = name, "Admin command rejected");
        AdminError::AdminRequired {
            mode: controller
                .mode()
                .map_or_else(|| "none".to_string(), |m| m.to_string()),
        }
        .into_server_error()
    })?;

    tracing::info!(command = name, "Admin command handled");
    Ok(finished_view(controller))
}

/// Admin page (requires admin access).
#[component]
pub fn AdminPage() -> impl IntoView {
    let page = Resource::new(|| (), |_| load_admin());
    let command = ServerAction::<RunAdminCommand>::new();

    // The latest command result replaces the initial lists.
    let current = move || match command.value().get() {
        Some(result) => Some(result),
        None => page.get(),
    };

    view! {
        <div class="admin-page">
            <h1>"Admin"</h1>
            <Suspense fallback=move || view! { <p>"Loading..."</p> }>
                {move || {
                    current().map(|result| match result {
                        Ok(view) => admin_view(view, command),
                        Err(_) => view! {
                            <NoticeBanner notice=Notice::StoreUnavailable/>
                        }.into_any(),
                    })
                }}
            </Suspense>
        </div>
    }
}

fn admin_view(page: PageView, command: ServerAction<RunAdminCommand>) -> AnyView {
    match page {
        PageView::Loading => view! { <p>"Loading..."</p> }.into_any(),
        PageView::Redirect { to, notice } => view! { <RedirectTo to=to notice=notice/> }.into_any(),
        PageView::Unavailable { notice } => view! { <NoticeBanner notice=notice/> }.into_any(),
        PageView::Admin {
            name,
            profiles,
            videos,
            notice,
        } => view! {
            <div class="admin-content">
                <p class="admin-name">{format!("Signed in as {}", name)}</p>
                {notice.map(|notice| view! { <NoticeBanner notice=notice/> })}
                <AddVideoForm command=command/>
                <section class="admin-section">
                    <h2>"Lessons"</h2>
                    <VideoTable videos=videos command=command/>
                </section>
                <section class="admin-section">
                    <h2>"Students"</h2>
                    <ProfileTable profiles=profiles command=command/>
                </section>
            </div>
        }
        .into_any(),
        PageView::Pending { .. } | PageView::Lessons { .. } => {
            view! { <Redirect path="/"/> }.into_any()
        }
    }
}

/// Asks the admin to confirm a destructive or access-changing action.
fn confirmed(message: &str) -> bool {
    window().confirm_with_message(message).unwrap_or(false)
}

#[component]
fn AddVideoForm(command: ServerAction<RunAdminCommand>) -> impl IntoView {
    let title = RwSignal::new(String::new());
    let source_url = RwSignal::new(String::new());

    let submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let title_value = title.get_untracked();
        command.dispatch(RunAdminCommand {
            command: AdminCommand::AddVideo {
                title: (!title_value.trim().is_empty()).then_some(title_value),
                source_url: source_url.get_untracked(),
            },
        });
        title.set(String::new());
        source_url.set(String::new());
    };

    view! {
        <form class="add-video" on:submit=submit>
            <input type="text" placeholder="Title (optional)" bind:value=title/>
            <input type="url" placeholder="YouTube, Drive, Dropbox, Mega, or video file link" required=true bind:value=source_url/>
            <button type="submit" disabled=move || command.pending().get()>"Add lesson"</button>
        </form>
    }
}

#[component]
fn VideoTable(videos: Vec<VideoRow>, command: ServerAction<RunAdminCommand>) -> impl IntoView {
    if videos.is_empty() {
        return view! { <p class="empty-state">"No lessons yet."</p> }.into_any();
    }

    view! {
        <table class="videos-table">
            <thead>
                <tr>
                    <th>"Title"</th>
                    <th>"Source"</th>
                    <th>"Added"</th>
                    <th>"Actions"</th>
                </tr>
            </thead>
            <tbody>
                {videos.into_iter().map(|video| {
                    let id = video.id.clone();
                    view! {
                        <tr>
                            <td>
                                <strong>{video.title}</strong>
                                <br/><small>{video.source_url}</small>
                            </td>
                            <td>{video.kind.to_string()}</td>
                            <td>{video.created_at}</td>
                            <td>
                                <button
                                    class="remove-btn"
                                    on:click=move |_| {
                                        if !confirmed("Remove this lesson?") {
                                            return;
                                        }
                                        match id.parse::<VideoId>() {
                                            Ok(id) => {
                                                command.dispatch(RunAdminCommand {
                                                    command: AdminCommand::RemoveVideo { id },
                                                });
                                            }
                                            Err(e) => leptos::logging::warn!("invalid video id: {e}"),
                                        }
                                    }
                                >"Remove"</button>
                            </td>
                        </tr>
                    }
                }).collect_view()}
            </tbody>
        </table>
    }
    .into_any()
}

#[component]
fn ProfileTable(profiles: Vec<ProfileRow>, command: ServerAction<RunAdminCommand>) -> impl IntoView {
    if profiles.is_empty() {
        return view! { <p class="empty-state">"No students have signed in yet."</p> }.into_any();
    }

    view! {
        <table class="profiles-table">
            <thead>
                <tr>
                    <th>"Name"</th>
                    <th>"Email"</th>
                    <th>"Status"</th>
                    <th>"Joined"</th>
                    <th>"Actions"</th>
                </tr>
            </thead>
            <tbody>
                {profiles.into_iter().map(|profile| {
                    let id = profile.identity_id.clone();
                    let authorized = profile.authorized;
                    let status = if profile.is_admin {
                        "Admin"
                    } else if authorized {
                        "Authorized"
                    } else {
                        "Pending"
                    };
                    let (label, prompt) = if authorized {
                        ("Revoke", "Revoke this student's access?")
                    } else {
                        ("Authorize", "Authorize this student to watch lessons?")
                    };
                    view! {
                        <tr>
                            <td>{profile.label}</td>
                            <td>{profile.email}</td>
                            <td>{status}</td>
                            <td>{profile.created_at}</td>
                            <td>
                                <button
                                    class="access-btn"
                                    on:click=move |_| {
                                        if !confirmed(prompt) {
                                            return;
                                        }
                                        let target = IdentityId::from(id.as_str());
                                        let command_value = if authorized {
                                            AdminCommand::Revoke { id: target }
                                        } else {
                                            AdminCommand::Authorize { id: target }
                                        };
                                        command.dispatch(RunAdminCommand { command: command_value });
                                    }
                                >{label}</button>
                            </td>
                        </tr>
                    }
                }).collect_view()}
            </tbody>
        </table>
    }
    .into_any()
}
