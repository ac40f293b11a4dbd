// Key-value store abstraction
// Records are JSON documents grouped into named collections, each write
// carrying its own expiration.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StoreBackend};

/// Collection holding session records, keyed by token.
pub const SESSIONS: &str = "sessions";
/// Collection holding audit log entries, keyed by log id.
pub const SESSION_LOGS: &str = "session_logs";

/// A key-value store with per-write TTL and full-collection scans. Safe for
/// concurrent use through a shared handle.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write a full document, replacing any existing one.
    async fn put(
        &self,
        collection: &str,
        key: &str,
        value: Value,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Point read. Expired records read as absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Partial field update: object fields in `patch` overwrite the stored
    /// document's, leaving all other fields untouched. Upserts the patch as
    /// the document when the key is absent, so callers need no
    /// read-before-write.
    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: Value,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// All live documents of a collection.
    async fn scan(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store errors
#[derive(Debug, Clone)]
pub enum StoreError {
    Connection(String),
    Serialization(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "connection error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Connect the backend selected by configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(memory::MemoryStore::new())),
        StoreBackend::Redis => Ok(Arc::new(
            self::redis::RedisStore::connect(&config.store_url()).await?,
        )),
    }
}
