//! `api` crate: HTTP surface of the playbook service.
//!
//! Routes, all JSON:
//!   GET    /health
//!   GET    /api/playbooks                     list (`?full=true` for full form)
//!   POST   /api/playbooks                     create (`?source=<id>` copies)
//!   PUT    /api/playbooks                     update (id in body)
//!   GET    /api/playbooks/:id                 read
//!   DELETE /api/playbooks/:id                 delete
//!   POST   /api/playbooks/:id/copy            copy
//!   GET    /api/playbooks/:id/workflows       list workflows
//!   POST   /api/playbooks/:id/workflows       create workflow (`?source=<id>` copies)
//!   PUT    /api/playbooks/:id/workflows       update workflow (id in body)
//!   GET    /api/playbooks/:id/workflows/:wid  read workflow
//!   DELETE /api/playbooks/:id/workflows/:wid  delete workflow
//!   POST   /api/playbooks/:id/workflows/:wid/copy

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod permissions;
pub mod state;

use axum::{routing::get, routing::post, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

use handlers::{playbooks, workflows};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/playbooks",
            get(playbooks::list).post(playbooks::create).put(playbooks::update),
        )
        .route(
            "/api/playbooks/:playbook_id",
            get(playbooks::read).delete(playbooks::delete),
        )
        .route("/api/playbooks/:playbook_id/copy", post(playbooks::copy))
        .route(
            "/api/playbooks/:playbook_id/workflows",
            get(workflows::list).post(workflows::create).put(workflows::update),
        )
        .route(
            "/api/playbooks/:playbook_id/workflows/:workflow_id",
            get(workflows::read).delete(workflows::delete),
        )
        .route(
            "/api/playbooks/:playbook_id/workflows/:workflow_id/copy",
            post(workflows::copy),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}
