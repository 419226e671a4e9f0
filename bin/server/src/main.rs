#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() {
    use axum::{Router, routing::get};
    use leptos::prelude::*;
    use leptos_axum::{LeptosRoutes, generate_route_list};
    use lesson_gate_server::{
        app::App,
        auth::{self, AppState, OidcClient},
        config::ServerConfig,
    };
    use std::sync::Arc;
    use tower_http::services::ServeDir;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    let db_pool = open_database(&config.database_url).await;

    sweep_expired_sessions(&db_pool, "startup").await;
    spawn_session_sweeper(db_pool.clone(), config.session.cleanup_interval_seconds);

    tracing::info!(issuer = config.oidc.issuer_url(), "Discovering identity provider");
    let oidc_client = OidcClient::discover(config.oidc)
        .await
        .expect("failed to discover OIDC provider");

    let app_state = Arc::new(AppState::new(db_pool, oidc_client, config.session));

    let leptos_options = get_configuration(None)
        .expect("failed to get leptos configuration")
        .leptos_options;
    let addr = leptos_options.site_addr;
    let state = CombinedState {
        leptos_options: leptos_options.clone(),
        app_state: app_state.clone(),
    };

    // Every page and server function sees the pool; the access gate reads
    // profiles through it on each request.
    let page_pool = app_state.db_pool.clone();
    let app = Router::new()
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .leptos_routes_with_context(
            &state,
            generate_route_list(App),
            move || provide_context(page_pool.clone()),
            move || shell(leptos_options.clone()),
        )
        .fallback(leptos_axum::file_and_error_handler::<CombinedState, _>(shell))
        .nest_service("/pkg", ServeDir::new("target/site/pkg"))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");
    tracing::info!("lesson-gate listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
        })
        .await
        .expect("server error");
}

/// Connects to PostgreSQL and brings the schema up to date.
#[cfg(feature = "ssr")]
async fn open_database(url: &str) -> sqlx::PgPool {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    tracing::info!("Database ready");

    pool
}

/// Deletes expired sign-in sessions, logging how many went.
#[cfg(feature = "ssr")]
async fn sweep_expired_sessions(pool: &sqlx::PgPool, trigger: &'static str) {
    use lesson_gate_server::auth::db::SessionRepository;

    match SessionRepository::new(pool.clone()).delete_expired().await {
        Ok(0) => {}
        Ok(count) => tracing::info!(deleted_sessions = count, trigger, "Expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, trigger, "Failed to remove expired sessions"),
    }
}

#[cfg(feature = "ssr")]
fn spawn_session_sweeper(pool: sqlx::PgPool, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_seconds));
        // The first tick completes immediately and startup already swept.
        interval.tick().await;
        loop {
            interval.tick().await;
            sweep_expired_sessions(&pool, "interval").await;
        }
    });
}

/// Router state: Leptos options for pages, app state for the auth routes.
#[cfg(feature = "ssr")]
#[derive(Clone)]
struct CombinedState {
    leptos_options: leptos::prelude::LeptosOptions,
    app_state: std::sync::Arc<lesson_gate_server::auth::AppState>,
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<CombinedState> for leptos::prelude::LeptosOptions {
    fn from_ref(state: &CombinedState) -> Self {
        state.leptos_options.clone()
    }
}

#[cfg(feature = "ssr")]
impl axum::extract::FromRef<CombinedState>
    for std::sync::Arc<lesson_gate_server::auth::AppState>
{
    fn from_ref(state: &CombinedState) -> Self {
        state.app_state.clone()
    }
}

#[cfg(feature = "ssr")]
fn shell(options: leptos::prelude::LeptosOptions) -> impl leptos::prelude::IntoView {
    use leptos::prelude::*;
    use leptos_meta::*;
    use lesson_gate_server::app::App;

    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>"Lessons"</title>
                <link rel="stylesheet" href="/pkg/lesson-gate.css"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

#[cfg(not(feature = "ssr"))]
fn main() {
    // The browser build hydrates from lib.rs.
}
