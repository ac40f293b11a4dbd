// Audit trail reader
// There is no index by token, so every query is a full scan of the log
// collection filtered in-process. Acceptable at this service's scale; the
// first thing to fix if log volume ever grows.

use serde_json::Value;
use std::sync::Arc;

use super::types::AuditLogEntry;
use crate::store::{KeyValueStore, StoreError, SESSION_LOGS};

/// Read side of the audit trail.
#[derive(Clone)]
pub struct AuditReader {
    store: Arc<dyn KeyValueStore>,
}

impl AuditReader {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All entries whose token matches exactly, timestamp-ascending. The
    /// timestamp only has second granularity and scan order is
    /// backend-dependent, so ties within a second are broken by log id;
    /// those are uuid v7, which sort in creation order. No matches is an
    /// empty vec, not an error.
    pub async fn entries_for_token(&self, token: &str) -> Result<Vec<AuditLogEntry>, StoreError> {
        let docs = self.store.scan(SESSION_LOGS).await?;

        let mut entries: Vec<AuditLogEntry> = docs
            .iter()
            .filter(|doc| doc.get("token").and_then(Value::as_str) == Some(token))
            .map(entry_from_doc)
            .collect();

        entries.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.log_id.cmp(&b.log_id))
        });
        Ok(entries)
    }
}

/// Malformed documents are defaulted field by field rather than excluded:
/// missing or ill-typed timestamps become 0, missing strings become empty.
fn entry_from_doc(doc: &Value) -> AuditLogEntry {
    AuditLogEntry {
        log_id: string_field(doc, "log_id"),
        token: string_field(doc, "token"),
        user_id: string_field(doc, "user_id"),
        action: string_field(doc, "action"),
        timestamp: doc.get("timestamp").and_then(Value::as_i64).unwrap_or(0),
        ip: string_field(doc, "ip"),
        user_agent: string_field(doc, "user_agent"),
    }
}

fn string_field(doc: &Value, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
