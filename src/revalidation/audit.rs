//! Bounded audit trail of dispatch attempts, newest first.

use std::sync::Arc;

use metrics::gauge;
use revalidate_api_types::DispatchAttempt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::warn;

use crate::application::error::error_chain;
use crate::application::repos::{AuditStore, StoreError};

use super::METRIC_AUDIT_LOG_LEN;

/// Entries beyond this count are dropped, oldest first.
pub const AUDIT_LOG_CAPACITY: usize = 100;

pub struct AuditLog {
    store: Arc<dyn AuditStore>,
    // Serializes read-modify-write cycles against the store.
    writer: Mutex<()>,
}

impl AuditLog {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            store,
            writer: Mutex::new(()),
        }
    }

    /// Prepend `attempt`, trimming the log to capacity. Returns the new length.
    ///
    /// A missing or corrupted stored value is treated as an empty log and
    /// overwritten.
    pub async fn record(&self, attempt: DispatchAttempt) -> Result<usize, StoreError> {
        let _guard = self.writer.lock().await;

        let mut entries = self.load_entries().await;
        entries.insert(0, attempt);
        entries.truncate(AUDIT_LOG_CAPACITY);

        let len = entries.len();
        self.store.save(serde_json::to_value(&entries)?).await?;
        gauge!(METRIC_AUDIT_LOG_LEN).set(len as f64);
        Ok(len)
    }

    /// All entries, newest first. Never fails; unreadable data reads as empty.
    pub async fn list(&self) -> Vec<DispatchAttempt> {
        self.load_entries().await
    }

    /// Delete the stored log. Returns whether the store accepted the removal.
    pub async fn clear(&self) -> bool {
        let _guard = self.writer.lock().await;
        match self.store.remove().await {
            Ok(()) => {
                gauge!(METRIC_AUDIT_LOG_LEN).set(0.0);
                true
            }
            Err(err) => {
                warn!(error = %error_chain(&err), "Failed to clear audit log");
                false
            }
        }
    }

    async fn load_entries(&self) -> Vec<DispatchAttempt> {
        match self.store.load().await {
            Ok(Some(value)) => decode_entries(value),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %error_chain(&err), "Audit log unreadable, treating as empty");
                Vec::new()
            }
        }
    }
}

fn decode_entries(value: Value) -> Vec<DispatchAttempt> {
    let Value::Array(items) = value else {
        warn!("Audit log is not a list, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item) {
            Ok(attempt) => Some(attempt),
            Err(err) => {
                warn!(position, error = %err, "Skipping malformed audit entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use revalidate_api_types::{
        AttemptStatus, HttpResponseRecord, RequestRecord, ResponseRecord,
    };
    use serde_json::json;
    use time::OffsetDateTime;

    use super::*;
    use crate::infra::audit_store::MemoryAuditStore;

    fn attempt(path: &str) -> DispatchAttempt {
        DispatchAttempt {
            timestamp: OffsetDateTime::now_utc(),
            path: path.to_string(),
            status: AttemptStatus::Success,
            status_code: Some(200),
            request: RequestRecord {
                url: format!("https://front.example/api?token=[redacted]&path={path}"),
                method: "GET".to_string(),
                headers: BTreeMap::new(),
                timeout: 30,
            },
            response: ResponseRecord::Http(HttpResponseRecord {
                code: 200,
                message: "OK".to_string(),
                body: "{}".to_string(),
                headers: BTreeMap::new(),
            }),
        }
    }

    #[tokio::test]
    async fn newest_entry_comes_first() {
        let log = AuditLog::new(Arc::new(MemoryAuditStore::new()));
        log.record(attempt("/a/")).await.expect("record");
        log.record(attempt("/b/")).await.expect("record");

        let paths: Vec<String> = log.list().await.into_iter().map(|a| a.path).collect();
        assert_eq!(paths, vec!["/b/", "/a/"]);
    }

    #[tokio::test]
    async fn log_is_capped_at_capacity() {
        let log = AuditLog::new(Arc::new(MemoryAuditStore::new()));
        for n in 0..(AUDIT_LOG_CAPACITY + 5) {
            log.record(attempt(&format!("/p{n}/"))).await.expect("record");
        }

        let entries = log.list().await;
        assert_eq!(entries.len(), AUDIT_LOG_CAPACITY);
        assert_eq!(entries[0].path, format!("/p{}/", AUDIT_LOG_CAPACITY + 4));
        assert_eq!(entries[AUDIT_LOG_CAPACITY - 1].path, "/p5/");
    }

    #[tokio::test]
    async fn non_list_value_is_replaced_on_next_record() {
        let store = Arc::new(MemoryAuditStore::with_value(json!({"oops": true})));
        let log = AuditLog::new(store);

        assert!(log.list().await.is_empty());
        assert_eq!(log.record(attempt("/a/")).await.expect("record"), 1);
        assert_eq!(log.list().await.len(), 1);
    }

    #[tokio::test]
    async fn malformed_entries_are_skipped() {
        let good = serde_json::to_value(attempt("/good/")).expect("encode");
        let store = Arc::new(MemoryAuditStore::with_value(json!([good, {"path": 3}, "junk"])));
        let log = AuditLog::new(store);

        let entries = log.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/good/");
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let log = AuditLog::new(Arc::new(MemoryAuditStore::new()));
        log.record(attempt("/a/")).await.expect("record");

        assert!(log.clear().await);
        assert!(log.list().await.is_empty());
        assert!(log.clear().await);
    }
}
