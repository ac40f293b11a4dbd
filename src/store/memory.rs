// In-memory store backend
// Suitable for development and testing; scans return records in write order.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use super::{KeyValueStore, StoreError};

struct Record {
    seq: u64,
    value: Value,
    expires_at: Instant,
}

/// In-memory implementation of [`KeyValueStore`].
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Record>>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        records.insert(
            key.to_string(),
            Record {
                seq: self.next_seq(),
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        let record = collections
            .get(collection)
            .and_then(|records| records.get(key))
            .filter(|record| record.expires_at > Instant::now());
        Ok(record.map(|record| record.value.clone()))
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        let now = Instant::now();

        let merged_in_place = match records.get_mut(key) {
            Some(record) if record.expires_at > now => {
                match (record.value.as_object_mut(), patch.as_object()) {
                    (Some(doc), Some(fields)) => {
                        for (field, value) in fields {
                            doc.insert(field.clone(), value.clone());
                        }
                    }
                    _ => record.value = patch.clone(),
                }
                record.expires_at = now + ttl;
                true
            }
            _ => false,
        };

        // Absent or expired: the patch becomes the document.
        if !merged_in_place {
            records.insert(
                key.to_string(),
                Record {
                    seq: self.next_seq(),
                    value: patch,
                    expires_at: now + ttl,
                },
            );
        }
        Ok(())
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let now = Instant::now();

        let mut live: Vec<(u64, Value)> = collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| record.expires_at > now)
                    .map(|record| (record.seq, record.value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        live.sort_by_key(|(seq, _)| *seq);
        Ok(live.into_iter().map(|(_, value)| value).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store
            .put("sessions", "t1", json!({ "user_id": "u1" }), TTL)
            .await
            .unwrap();

        let doc = store.get("sessions", "t1").await.unwrap().unwrap();
        assert_eq!(doc["user_id"], "u1");
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get("sessions", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_record_reads_as_absent() {
        let store = MemoryStore::new();
        store
            .put("sessions", "t1", json!({ "user_id": "u1" }), Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.get("sessions", "t1").await.unwrap().is_none());
        assert!(store.scan("sessions").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_updates_only_patched_fields() {
        let store = MemoryStore::new();
        store
            .put(
                "sessions",
                "t1",
                json!({ "user_id": "u1", "is_valid": true, "last_used": 100 }),
                TTL,
            )
            .await
            .unwrap();

        store
            .merge("sessions", "t1", json!({ "last_used": 200 }), TTL)
            .await
            .unwrap();

        let doc = store.get("sessions", "t1").await.unwrap().unwrap();
        assert_eq!(doc["user_id"], "u1");
        assert_eq!(doc["is_valid"], true);
        assert_eq!(doc["last_used"], 200);
    }

    #[tokio::test]
    async fn test_merge_upserts_missing_key() {
        let store = MemoryStore::new();
        store
            .merge("sessions", "ghost", json!({ "is_valid": false }), TTL)
            .await
            .unwrap();

        let doc = store.get("sessions", "ghost").await.unwrap().unwrap();
        assert_eq!(doc["is_valid"], false);
    }

    #[tokio::test]
    async fn test_scan_returns_write_order() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store
                .put("session_logs", &format!("k{}", i), json!({ "n": i }), TTL)
                .await
                .unwrap();
        }

        let docs = store.scan("session_logs").await.unwrap();
        let order: Vec<i64> = docs.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_scan_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.scan("nothing").await.unwrap().is_empty());
    }
}
