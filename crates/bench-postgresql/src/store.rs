//! PostgreSQL-backed record store.

use crate::connect::connect;
use crate::error::PostgreSQLBenchError;
use crate::sql::{count_statement, insert_statement, select_recent_statement, truncate_statement};
use async_trait::async_trait;
use bench_core::{Record, RecordStore, StoreError, Variant};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;
use tracing::{debug, info};

/// Record store over a fixed set of PostgreSQL clients.
///
/// Callers are spread over the clients round-robin; each client
/// pipelines the statements it receives.
pub struct PostgreSQLStore {
    clients: Vec<Client>,
    next: AtomicUsize,
}

impl PostgreSQLStore {
    /// Connect `connections` clients to `connection_string`.
    pub async fn connect(
        connection_string: &str,
        connections: usize,
    ) -> Result<Self, PostgreSQLBenchError> {
        let clients = connect(connection_string, connections).await?;
        Self::with_clients(clients)
    }

    /// Build a store over already connected clients.
    pub fn with_clients(clients: Vec<Client>) -> Result<Self, PostgreSQLBenchError> {
        if clients.is_empty() {
            return Err(PostgreSQLBenchError::Config(
                "at least one connection is required".to_string(),
            ));
        }
        Ok(Self {
            clients,
            next: AtomicUsize::new(0),
        })
    }

    /// Number of clients in the store.
    pub fn connection_count(&self) -> usize {
        self.clients.len()
    }

    fn client(&self) -> &Client {
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[i]
    }

    /// Remove every row of `variant`'s table.
    pub async fn truncate(&self, variant: Variant) -> Result<(), PostgreSQLBenchError> {
        info!("Truncating table: {}", variant.table_name());
        self.client()
            .batch_execute(&truncate_statement(variant))
            .await?;
        Ok(())
    }

    async fn insert_record(&self, record: &Record) -> Result<(), PostgreSQLBenchError> {
        let sql = insert_statement(record);
        let client = self.client();
        match record {
            Record::AutoIncrement(r) => {
                client.execute(&sql, &[&r.kind.as_str()]).await?;
            }
            Record::Identity(r) => {
                client.execute(&sql, &[&r.kind.as_str()]).await?;
            }
            Record::Timestamp(r) => match &r.created_at {
                Some(created_at) => {
                    client.execute(&sql, &[created_at]).await?;
                }
                None => {
                    client.execute(&sql, &[]).await?;
                }
            },
            Record::Uuid(_) => {
                client.execute(&sql, &[]).await?;
            }
            Record::HighResTimestamp(r) => {
                let nanos = i32::try_from(r.created_at_nanos).map_err(|_| {
                    PostgreSQLBenchError::OutOfRange {
                        column: "created_at_nanos",
                        value: i64::from(r.created_at_nanos),
                    }
                })?;
                let params: [&(dyn ToSql + Sync); 2] = [&r.created_at_seconds, &nanos];
                client.execute(&sql, &params).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgreSQLStore {
    async fn insert(&self, record: &Record) -> Result<(), StoreError> {
        Ok(self.insert_record(record).await?)
    }

    async fn fetch_recent(&self, variant: Variant, limit: u32) -> Result<usize, StoreError> {
        let sql = select_recent_statement(variant).ok_or(StoreError::NoRecencyKey(variant))?;
        let limit = i64::from(limit);
        let rows = self
            .client()
            .query(&sql, &[&limit])
            .await
            .map_err(PostgreSQLBenchError::from)?;
        debug!("Fetched {} rows from {}", rows.len(), variant.table_name());
        Ok(rows.len())
    }

    async fn row_count(&self, variant: Variant) -> Result<u64, StoreError> {
        let row = self
            .client()
            .query_one(&count_statement(variant), &[])
            .await
            .map_err(PostgreSQLBenchError::from)?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as u64)
    }
}
