// Audit log types

use serde::{Deserialize, Serialize};

/// Session lifecycle actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Validate,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Validate => "validate",
            AuditAction::Delete => "delete",
        }
    }
}

/// One immutable audit record, keyed by log_id in the "session_logs"
/// collection. Entries expire with the session TTL and are never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub log_id: String,
    /// Token of the session the event belongs to; not enforced as a
    /// reference.
    pub token: String,
    /// May be empty, e.g. on delete events.
    pub user_id: String,
    /// "create" | "validate" | "delete"; kept loose so malformed stored
    /// entries can still be read back.
    pub action: String,
    /// Unix seconds.
    pub timestamp: i64,
    pub ip: String,
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::Create.as_str(), "create");
        assert_eq!(AuditAction::Validate.as_str(), "validate");
        assert_eq!(AuditAction::Delete.as_str(), "delete");
    }

    #[test]
    fn test_action_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AuditAction::Validate).unwrap(),
            "\"validate\""
        );
    }
}
