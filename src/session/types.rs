// Session types and request payloads

use serde::{Deserialize, Serialize};

/// Stored session document. The token is the record's key in the "sessions"
/// collection and is not repeated in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    /// Unix seconds, set once at creation.
    pub created_at: i64,
    pub ip: String,
    pub user_agent: String,
    /// Optional at creation; stored as an empty string when absent.
    #[serde(default)]
    pub device: String,
    /// Unix seconds, advanced on every successful validation.
    pub last_used: i64,
    /// One-way flag: set false on deletion, never back to true.
    pub is_valid: bool,
}

/// Body of POST /session. Missing fields deserialize to empty strings so
/// that missing and empty take the same validation path.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub device: String,
}
