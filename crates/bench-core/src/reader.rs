//! Periodic reader polling the most recent rows of a variant.

use crate::error::BenchError;
use crate::model::Variant;
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Maximum rows fetched per poll.
pub const DEFAULT_READ_LIMIT: u32 = 1000;

/// Counters returned when a reader stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Number of queries issued.
    pub polls: u64,
    /// Rows retrieved across all polls.
    pub rows_read: u64,
    /// Rows retrieved by the latest poll.
    pub last_rows: usize,
}

pub struct PeriodicReader {
    variant: Variant,
    store: Arc<dyn RecordStore>,
    interval: Duration,
    limit: u32,
}

impl PeriodicReader {
    /// Create a reader using the variant's default interval and a 1000 row limit.
    pub fn new(variant: Variant, store: Arc<dyn RecordStore>) -> Self {
        Self {
            variant,
            store,
            interval: variant.default_reader_interval(),
            limit: DEFAULT_READ_LIMIT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Poll every `interval` until `stop` is cancelled.
    ///
    /// The stop token is checked ahead of every tick, so no query is issued
    /// once it has fired. A failed query ends the loop with an error.
    pub async fn run(self, stop: CancellationToken) -> Result<ReaderStats, BenchError> {
        let label = self.variant.worker_label();
        info!("{}Reader started...", label);

        let mut stats = ReaderStats::default();
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    info!("{}Reader done", label);
                    return Ok(stats);
                }
                _ = tokio::time::sleep(self.interval) => {
                    let rows = self
                        .store
                        .fetch_recent(self.variant, self.limit)
                        .await
                        .map_err(|source| BenchError::Query {
                            table: self.variant.table_name(),
                            source,
                        })?;
                    stats.polls += 1;
                    stats.rows_read += rows as u64;
                    stats.last_rows = rows;
                    info!("{}Reader read {} rows", label, rows);
                }
            }
        }
    }
}
