// Best-effort audit trail writer
// Appends go through a bounded queue drained by a background task; the
// caller's primary operation never waits on or fails because of an audit
// write. A saturated queue drops entries and counts the drops.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};
use uuid::{ContextV7, Timestamp, Uuid};

use super::types::{AuditAction, AuditLogEntry};
use crate::store::{KeyValueStore, SESSION_LOGS};

const QUEUE_CAPACITY: usize = 1024;

enum Message {
    Entry(AuditLogEntry),
    Flush(oneshot::Sender<()>),
}

/// Handle for appending audit entries. Cloneable; clones share the queue and
/// the dropped-entry counter.
#[derive(Clone)]
pub struct AuditWriter {
    tx: mpsc::Sender<Message>,
    dropped: Arc<AtomicU64>,
    // Shared v7 context so log ids stay strictly increasing even within
    // one millisecond; the reader relies on them as an order tiebreaker.
    // ContextV7 is not Sync, so sharing it requires a mutex.
    v7: Arc<Mutex<ContextV7>>,
    ua_from_ip: bool,
}

impl AuditWriter {
    /// Spawn the drain task and return the writer handle. Entries are stored
    /// with the same TTL as session records.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, ua_from_ip: bool) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(drain(store, ttl, rx));

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            v7: Arc::new(Mutex::new(ContextV7::new())),
            ua_from_ip,
        }
    }

    /// Queue one entry. Non-blocking: a full or closed queue drops the entry
    /// and bumps the dropped counter.
    pub fn append(&self, token: &str, user_id: &str, action: AuditAction, ip: &str) {
        // Legacy log format: create and validate events store the ip value
        // in the user_agent field. Controlled by the audit_ua_from_ip flag.
        let user_agent = if self.ua_from_ip
            && matches!(action, AuditAction::Create | AuditAction::Validate)
        {
            ip.to_string()
        } else {
            String::new()
        };

        let entry = AuditLogEntry {
            log_id: Uuid::new_v7(Timestamp::now(&*self.v7.lock().unwrap())).to_string(),
            token: token.to_string(),
            user_id: user_id.to_string(),
            action: action.as_str().to_string(),
            timestamp: Utc::now().timestamp(),
            ip: ip.to_string(),
            user_agent,
        };

        if self.tx.try_send(Message::Entry(entry)).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            warn!("audit queue saturated, dropped entry ({} total)", dropped);
        }
    }

    /// Entries dropped because the queue was full, since startup.
    pub fn dropped_entries(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Wait until everything queued before this call has been written. Used
    /// at shutdown and in tests.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Message::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }
}

async fn drain(store: Arc<dyn KeyValueStore>, ttl: Duration, mut rx: mpsc::Receiver<Message>) {
    while let Some(message) = rx.recv().await {
        match message {
            Message::Entry(entry) => {
                let doc = match serde_json::to_value(&entry) {
                    Ok(doc) => doc,
                    Err(e) => {
                        error!("unserializable audit entry {}: {}", entry.log_id, e);
                        continue;
                    }
                };
                // Store failures are logged, never propagated to the caller.
                if let Err(e) = store.put(SESSION_LOGS, &entry.log_id, doc, ttl).await {
                    error!("failed to store audit entry {}: {}", entry.log_id, e);
                }
            }
            Message::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}
