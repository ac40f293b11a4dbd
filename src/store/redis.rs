// Redis store backend
// Documents are JSON strings under "{collection}:{key}" with SET EX for TTL;
// full-collection scans use SCAN MATCH.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{KeyValueStore, StoreError};

/// Redis implementation of [`KeyValueStore`].
pub struct RedisStore {
    conn: Arc<Mutex<MultiplexedConnection>>,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(connection_error)?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(connection_error)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn record_key(collection: &str, key: &str) -> String {
        format!("{}:{}", collection, key)
    }
}

fn connection_error(err: redis::RedisError) -> StoreError {
    StoreError::Connection(err.to_string())
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(&value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let mut conn = self.conn.lock().await;
        conn.set_ex::<_, _, ()>(Self::record_key(collection, key), body, ttl.as_secs())
            .await
            .map_err(connection_error)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.conn.lock().await;
        let body: Option<String> = conn
            .get(Self::record_key(collection, key))
            .await
            .map_err(connection_error)?;

        match body {
            Some(body) => serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let record_key = Self::record_key(collection, key);

        // Read-merge-write: the store only supports full-document overwrite,
        // so concurrent writers of the same key may interleave. Staleness of
        // a single field is tolerated here.
        let mut conn = self.conn.lock().await;
        let body: Option<String> = conn.get(&record_key).await.map_err(connection_error)?;

        let merged = match body {
            Some(body) => {
                let mut doc: Value = serde_json::from_str(&body)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                match (doc.as_object_mut(), patch.as_object()) {
                    (Some(doc), Some(fields)) => {
                        for (field, value) in fields {
                            doc.insert(field.clone(), value.clone());
                        }
                    }
                    _ => doc = patch.clone(),
                }
                doc
            }
            None => patch,
        };

        let body = serde_json::to_string(&merged)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        conn.set_ex::<_, _, ()>(record_key, body, ttl.as_secs())
            .await
            .map_err(connection_error)
    }

    async fn scan(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let pattern = format!("{}:*", collection);
        let mut conn = self.conn.lock().await;

        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(&pattern)
                .await
                .map_err(connection_error)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let bodies: Vec<Option<String>> = conn.mget(&keys).await.map_err(connection_error)?;

        let mut docs = Vec::with_capacity(bodies.len());
        for body in bodies.into_iter().flatten() {
            match serde_json::from_str(&body) {
                Ok(doc) => docs.push(doc),
                Err(e) => debug!("skipping unparsable record during scan: {}", e),
            }
        }
        Ok(docs)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().await;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(connection_error)?;
        Ok(())
    }
}
