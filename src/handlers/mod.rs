// HTTP endpoint layer: thin adapters from routes to the session core

pub mod health;
pub mod session;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::audit::reader::AuditReader;
use crate::audit::writer::AuditWriter;
use crate::session::store::SessionStore;
use crate::store::KeyValueStore;

/// Shared per-process context, constructed once at startup and cloned into
/// each handler. No global state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub sessions: SessionStore,
    pub logs: AuditReader,
    pub audit: AuditWriter,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/session", post(session::create_session))
        .route(
            "/session/:token",
            get(session::validate_session).delete(session::delete_session),
        )
        .route("/session/:token/logs", get(session::get_session_logs))
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
