//! In-memory record store.
//!
//! Behaves like the database tables as far as the harness can tell: keys
//! and default timestamps are assigned on insert, recent rows come back
//! newest first. Latency and a single failing insert can be injected.

use crate::error::StoreError;
use crate::model::{Record, Variant};
use crate::store::RecordStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Record store backed by per-variant vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Variant, Vec<Record>>>,
    next_id: AtomicI64,
    inserts: AtomicU64,
    queries: AtomicU64,
    insert_delay: Option<Duration>,
    fail_on_insert: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every insert.
    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    /// Fail the `nth` insert attempt (1-based) across all workers.
    pub fn with_failure_on_insert(mut self, nth: u64) -> Self {
        self.fail_on_insert = Some(nth);
        self
    }

    /// Seed `variant`'s table with `count` rows.
    pub fn with_rows(mut self, variant: Variant, count: u64) -> Self {
        let mut rng = rand::thread_rng();
        let seeded: Vec<Record> = crate::generator::build_batch(variant, count, &mut rng)
            .into_iter()
            .map(|record| self.assign_defaults(record))
            .collect();
        self.tables
            .get_mut()
            .entry(variant)
            .or_default()
            .extend(seeded);
        self
    }

    /// Number of insert attempts seen so far, failed ones included.
    pub fn insert_attempts(&self) -> u64 {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of `fetch_recent` calls served so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored rows of `variant`, oldest first.
    pub async fn rows(&self, variant: Variant) -> Vec<Record> {
        self.tables
            .lock()
            .await
            .get(&variant)
            .cloned()
            .unwrap_or_default()
    }

    fn assign_defaults(&self, record: Record) -> Record {
        match record {
            Record::AutoIncrement(mut r) => {
                r.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                Record::AutoIncrement(r)
            }
            Record::Identity(mut r) => {
                r.id = Some(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
                Record::Identity(r)
            }
            Record::Uuid(mut r) => {
                r.id = Some(Uuid::new_v4());
                Record::Uuid(r)
            }
            Record::Timestamp(mut r) => {
                r.created_at = r.created_at.or_else(|| Some(Utc::now()));
                Record::Timestamp(r)
            }
            other @ Record::HighResTimestamp(_) => other,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: &Record) -> Result<(), StoreError> {
        let attempt = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on_insert == Some(attempt) {
            return Err(StoreError::Injected(attempt));
        }

        let stored = self.assign_defaults(record.clone());
        self.tables
            .lock()
            .await
            .entry(record.variant())
            .or_default()
            .push(stored);
        Ok(())
    }

    async fn fetch_recent(&self, variant: Variant, limit: u32) -> Result<usize, StoreError> {
        if variant.recency_order().is_none() {
            return Err(StoreError::NoRecencyKey(variant));
        }
        self.queries.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().await;
        let available = tables.get(&variant).map_or(0, Vec::len);
        Ok(available.min(limit as usize))
    }

    async fn row_count(&self, variant: Variant) -> Result<u64, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.get(&variant).map_or(0, |rows| rows.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AutoIncrementRecord, PrimaryKey, TimestampRecord, TypeTag};

    fn auto_increment(letter: &str) -> Record {
        Record::AutoIncrement(AutoIncrementRecord {
            id: None,
            kind: TypeTag::from_letter(letter).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_insert_assigns_keys() {
        let store = MemoryStore::new();
        store.insert(&auto_increment("a")).await.unwrap();
        store.insert(&auto_increment("b")).await.unwrap();

        let rows = store.rows(Variant::AutoIncrement).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].primary_key(), Some(PrimaryKey::Int(1)));
        assert_eq!(rows[1].primary_key(), Some(PrimaryKey::Int(2)));
    }

    #[tokio::test]
    async fn test_insert_fills_default_timestamp() {
        let store = MemoryStore::new();
        store
            .insert(&Record::Timestamp(TimestampRecord { created_at: None }))
            .await
            .unwrap();

        let rows = store.rows(Variant::Timestamp).await;
        match &rows[0] {
            Record::Timestamp(r) => assert!(r.created_at.is_some()),
            other => panic!("Unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_recent_is_capped_by_limit() {
        let store = MemoryStore::new().with_rows(Variant::AutoIncrement, 1500);
        assert_eq!(
            store.fetch_recent(Variant::AutoIncrement, 1000).await.unwrap(),
            1000
        );
        assert_eq!(store.fetch_recent(Variant::Identity, 1000).await.unwrap(), 0);
        assert_eq!(store.query_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_recent_rejects_uuid() {
        let store = MemoryStore::new();
        let err = store.fetch_recent(Variant::Uuid, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::NoRecencyKey(Variant::Uuid)));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new().with_failure_on_insert(2);
        store.insert(&auto_increment("a")).await.unwrap();
        let err = store.insert(&auto_increment("a")).await.unwrap_err();
        assert!(matches!(err, StoreError::Injected(2)));
        store.insert(&auto_increment("a")).await.unwrap();

        assert_eq!(store.insert_attempts(), 3);
        assert_eq!(store.row_count(Variant::AutoIncrement).await.unwrap(), 2);
    }
}
