// Health endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;

/// GET /health — always 200; reports store reachability and how many audit
/// entries have been dropped since startup.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let store_status = match state.store.ping().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "session-api",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store_status,
            "audit_dropped": state.audit.dropped_entries(),
        })),
    )
}
