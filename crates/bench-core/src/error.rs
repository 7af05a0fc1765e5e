//! Error types for the benchmark harness.

use crate::model::Variant;
use thiserror::Error;

/// Boxed error produced by a storage backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by a [`RecordStore`](crate::store::RecordStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend connection or statement error.
    #[error("Database error: {0}")]
    Database(#[source] BoxError),

    /// The variant has no column to order recent rows by.
    #[error("Variant '{0}' has no recency key")]
    NoRecencyKey(Variant),

    /// Injected failure (in-memory store only).
    #[error("Injected failure on insert #{0}")]
    Injected(u64),
}

impl StoreError {
    /// Wrap any backend error.
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Database(Box::new(err))
    }
}

/// Errors that abort a benchmark run.
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration rejected before any work started.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An insert failed; the run is aborted.
    #[error("Inserter {worker} failed to insert into {table}: {source}")]
    Insert {
        worker: usize,
        table: &'static str,
        #[source]
        source: StoreError,
    },

    /// A periodic read failed; the run is aborted.
    #[error("Reader failed to query {table}: {source}")]
    Query {
        table: &'static str,
        #[source]
        source: StoreError,
    },

    /// A generator could not hand off a record because every inserter is gone.
    #[error("Generator {0} found the record channel closed")]
    ChannelClosed(usize),

    /// An inserter stopped before the run told it to.
    #[error("Inserter {0} exited before the run completed")]
    WorkerExited(usize),

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
