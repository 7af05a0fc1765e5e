//! Storage capability used by inserters and readers.
//!
//! The harness never talks to a database directly: it is handed something
//! that can insert one record and fetch the most recent rows of a variant.

use crate::error::StoreError;
use crate::model::{Record, Variant};
use async_trait::async_trait;

/// Trait for the persistence side of the benchmark.
///
/// Implementations are shared across all inserters and readers, so every
/// method takes `&self` and must be safe to call concurrently.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert one record into its variant's table.
    async fn insert(&self, record: &Record) -> Result<(), StoreError>;

    /// Fetch up to `limit` of the most recent rows of `variant`, newest first.
    ///
    /// Returns the number of rows retrieved.
    async fn fetch_recent(&self, variant: Variant, limit: u32) -> Result<usize, StoreError>;

    /// Total number of rows currently stored for `variant`.
    async fn row_count(&self, variant: Variant) -> Result<u64, StoreError>;
}
