// Session store: create, validate, soft-invalidate

use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::types::{CreateSessionRequest, SessionRecord};
use crate::audit::types::AuditAction;
use crate::audit::writer::AuditWriter;
use crate::error::SessionError;
use crate::store::{KeyValueStore, StoreError, SESSIONS};

/// High-level session operations over the key-value store. Cloneable; all
/// fields are shared handles.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    audit: AuditWriter,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, audit: AuditWriter, ttl: Duration) -> Self {
        Self { store, audit, ttl }
    }

    /// Create a session and return its token. Rejects empty required fields
    /// before touching the store.
    pub async fn create(&self, req: &CreateSessionRequest) -> Result<String, SessionError> {
        for (field, value) in [
            ("user_id", &req.user_id),
            ("ip", &req.ip),
            ("user_agent", &req.user_agent),
        ] {
            if value.is_empty() {
                return Err(SessionError::Validation(format!("{} is required", field)));
            }
        }

        let token = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let record = SessionRecord {
            user_id: req.user_id.clone(),
            created_at: now,
            ip: req.ip.clone(),
            user_agent: req.user_agent.clone(),
            device: req.device.clone(),
            last_used: now,
            is_valid: true,
        };

        let doc = serde_json::to_value(&record)
            .map_err(|e| SessionError::Store(StoreError::Serialization(e.to_string())))?;
        self.store.put(SESSIONS, &token, doc, self.ttl).await?;

        self.audit
            .append(&token, &record.user_id, AuditAction::Create, &record.ip);
        info!("created session {} for user {}", token, record.user_id);

        Ok(token)
    }

    /// Validate a token and return its user id. The only operation that
    /// extends a session's usable life.
    pub async fn validate(&self, token: &str) -> Result<String, SessionError> {
        let doc = self
            .store
            .get(SESSIONS, token)
            .await?
            .ok_or(SessionError::NotFound)?;

        // Revoked records read as invalid, as do partial documents left by a
        // blind invalidate of a token that was never created.
        if !doc.get("is_valid").and_then(Value::as_bool).unwrap_or(false) {
            return Err(SessionError::Invalidated);
        }

        let user_id = string_field(&doc, "user_id");
        let ip = string_field(&doc, "ip");

        // Sparse update: nothing but last_used may be touched here.
        let now = Utc::now().timestamp();
        self.store
            .merge(SESSIONS, token, json!({ "last_used": now }), self.ttl)
            .await?;

        self.audit.append(token, &user_id, AuditAction::Validate, &ip);

        Ok(user_id)
    }

    /// Soft-revoke a token. A blind write with no read first, so revoking an
    /// unknown or already revoked token succeeds with the same final state.
    pub async fn invalidate(&self, token: &str) -> Result<(), SessionError> {
        self.store
            .merge(SESSIONS, token, json!({ "is_valid": false }), self.ttl)
            .await?;

        self.audit.append(token, "", AuditAction::Delete, "");
        info!("invalidated session {}", token);

        Ok(())
    }
}

fn string_field(doc: &Value, field: &str) -> String {
    doc.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::collections::HashSet;

    const TTL: Duration = Duration::from_secs(1800);

    fn request(user_id: &str, ip: &str, user_agent: &str) -> CreateSessionRequest {
        CreateSessionRequest {
            user_id: user_id.to_string(),
            ip: ip.to_string(),
            user_agent: user_agent.to_string(),
            device: String::new(),
        }
    }

    fn setup() -> (SessionStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let kv: Arc<dyn KeyValueStore> = store.clone();
        let audit = AuditWriter::new(kv.clone(), TTL, true);
        (SessionStore::new(kv, audit, TTL), store)
    }

    #[tokio::test]
    async fn test_create_then_validate_returns_user_id() {
        let (sessions, _) = setup();

        let token = sessions
            .create(&request("u1", "1.2.3.4", "agentX"))
            .await
            .unwrap();
        let user_id = sessions.validate(&token).await.unwrap();

        assert_eq!(user_id, "u1");
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let (sessions, _) = setup();

        let mut tokens = HashSet::new();
        for _ in 0..10 {
            let token = sessions
                .create(&request("u1", "1.2.3.4", "agentX"))
                .await
                .unwrap();
            assert!(tokens.insert(token));
        }
    }

    #[tokio::test]
    async fn test_validate_unknown_token_is_not_found() {
        let (sessions, _) = setup();

        let err = sessions.validate("no-such-token").await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound));
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let (sessions, _) = setup();

        let token = sessions
            .create(&request("u1", "1.2.3.4", "agentX"))
            .await
            .unwrap();

        sessions.invalidate(&token).await.unwrap();
        sessions.invalidate(&token).await.unwrap();

        let err = sessions.validate(&token).await.unwrap_err();
        assert!(matches!(err, SessionError::Invalidated));
    }

    #[tokio::test]
    async fn test_invalidate_unknown_token_succeeds() {
        let (sessions, _) = setup();

        sessions.invalidate("never-created").await.unwrap();

        // The blind write leaves a partial record, which validates as revoked
        // rather than missing.
        let err = sessions.validate("never-created").await.unwrap_err();
        assert!(matches!(err, SessionError::Invalidated));
    }

    #[tokio::test]
    async fn test_create_with_empty_fields_writes_nothing() {
        let (sessions, store) = setup();

        for req in [
            request("", "1.2.3.4", "agentX"),
            request("u1", "", "agentX"),
            request("u1", "1.2.3.4", ""),
        ] {
            let err = sessions.create(&req).await.unwrap_err();
            assert!(matches!(err, SessionError::Validation(_)));
        }

        assert!(store.scan(SESSIONS).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_does_not_disturb_other_fields() {
        let (sessions, store) = setup();

        let token = sessions
            .create(&request("u1", "1.2.3.4", "agentX"))
            .await
            .unwrap();
        sessions.validate(&token).await.unwrap();

        let doc = store.get(SESSIONS, &token).await.unwrap().unwrap();
        assert_eq!(doc["user_id"], "u1");
        assert_eq!(doc["ip"], "1.2.3.4");
        assert_eq!(doc["user_agent"], "agentX");
        assert_eq!(doc["is_valid"], true);
        assert!(doc["last_used"].as_i64().unwrap() >= doc["created_at"].as_i64().unwrap());
    }
}
