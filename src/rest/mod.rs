use std::net::SocketAddr;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::storage::Storage;

pub mod error;
pub mod extract;
mod handlers;
pub mod models;
#[cfg(test)]
mod tests;

use handlers::{
    accessions, entries, info, not_found, reports, repositories, resources, session, users,
    vocabularies, API_VERSION,
};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub storage: S,
    pub started_at: std::time::SystemTime,
}

impl<S: Storage> AppState<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            started_at: std::time::SystemTime::now(),
        }
    }
}

fn api_routes<S: Storage + Clone + Send + Sync + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(info::<S>))
        .route("/users/:email/login", post(session::api_login::<S>))
        .route("/logout", delete(session::api_logout::<S>))
        .route("/delete_sessions", delete(session::delete_sessions::<S>))
        .route("/vocabularies", get(vocabularies))
        .route(
            "/repositories",
            get(repositories::list::<S>).post(repositories::create::<S>),
        )
        .route(
            "/repositories/:id",
            get(repositories::show::<S>)
                .put(repositories::update::<S>)
                .delete(repositories::delete::<S>),
        )
        .route("/repositories/:id/entries", get(repositories::entries::<S>))
        .route("/repositories/:id/summary", get(repositories::summary::<S>))
        .route(
            "/resources",
            get(resources::list::<S>).post(resources::create::<S>),
        )
        .route(
            "/resources/:id",
            get(resources::show::<S>)
                .put(resources::update::<S>)
                .delete(resources::delete::<S>),
        )
        .route("/resources/:id/entries", get(resources::entries::<S>))
        .route("/resources/:id/summary", get(resources::summary::<S>))
        .route("/resources/:id/csv", get(resources::csv::<S>))
        .route(
            "/accessions",
            get(accessions::list::<S>).post(accessions::create::<S>),
        )
        .route(
            "/accessions/:id",
            get(accessions::show::<S>)
                .put(accessions::update::<S>)
                .delete(accessions::delete::<S>),
        )
        .route("/accessions/:id/entries", get(accessions::entries::<S>))
        .route("/accessions/:id/summary", get(accessions::summary::<S>))
        .route("/accessions/:id/csv", get(accessions::csv::<S>))
        .route("/accessions/:id/slew", post(accessions::slew::<S>))
        .route(
            "/entries",
            get(entries::list::<S>).post(entries::create::<S>),
        )
        .route("/entries/find", post(entries::find_by_media_id::<S>))
        .route("/entries/csv", get(entries::csv::<S>))
        .route(
            "/entries/:id",
            get(entries::show::<S>)
                .put(entries::update::<S>)
                .delete(entries::delete::<S>),
        )
        .route(
            "/entries/:id/update_location",
            patch(entries::update_location::<S>),
        )
        .route("/entries/:id/previous", get(entries::previous::<S>))
        .route("/entries/:id/next", get(entries::next::<S>))
        .route("/entries/:id/clone", post(entries::clone_entry::<S>))
        .route("/reports/summary", get(reports::summary::<S>))
}

fn browser_routes<S: Storage + Clone + Send + Sync + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(session::dashboard::<S>))
        .route("/users/authenticate", post(session::authenticate::<S>))
        .route("/users/logout", get(session::logout::<S>))
        .route("/sessions/dump", get(session::dump))
        .route("/users", get(users::list::<S>))
        .route("/users/create", post(users::create::<S>))
        .route(
            "/users/:id/reset_password",
            post(users::reset_password::<S>),
        )
        .route("/users/:id/deactivate", get(users::deactivate::<S>))
        .route("/users/:id/reactivate", get(users::reactivate::<S>))
        .route("/users/:id/make_admin", get(users::make_admin::<S>))
        .route("/users/:id/remove_admin", get(users::remove_admin::<S>))
        .route("/users/:id/allow_api", get(users::allow_api::<S>))
        .route("/users/:id/revoke_api", get(users::revoke_api::<S>))
        .route("/reports/range", post(reports::range::<S>))
        .route("/reports/csv", post(reports::csv::<S>))
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .nest(&format!("/api/{API_VERSION}"), api_routes::<S>())
        .merge(browser_routes::<S>())
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(::tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(::tracing::Level::INFO)),
        )
        .with_state(state)
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    storage: S,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    let app = router(AppState::new(storage));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("🌐 REST listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.cancelled().await;
        log::info!("🛑 REST shutdown requested");
    })
    .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
