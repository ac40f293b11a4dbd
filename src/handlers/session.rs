// Handlers for the /session endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use super::AppState;
use crate::error::SessionError;
use crate::session::types::CreateSessionRequest;

/// POST /session — 200 {token}, 400 on a missing required field.
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<Value>, SessionError> {
    let token = state.sessions.create(&payload).await?;
    Ok(Json(json!({ "token": token })))
}

/// GET /session/:token — 200 {valid, user_id}, 404/401 {valid: false}.
pub async fn validate_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, SessionError> {
    let user_id = state.sessions.validate(&token).await?;
    Ok(Json(json!({ "valid": true, "user_id": user_id })))
}

/// DELETE /session/:token — 204, even for tokens that never existed.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode, SessionError> {
    state.sessions.invalidate(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /session/:token/logs — 200 {logs: [...]}, 500 on scan failure.
pub async fn get_session_logs(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Value>, SessionError> {
    let logs = state.logs.entries_for_token(&token).await?;
    Ok(Json(json!({ "logs": logs })))
}
