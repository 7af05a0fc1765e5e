//! Error types for the PostgreSQL backend.

use bench_core::StoreError;
use thiserror::Error;

/// Errors that can occur while talking to PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgreSQLBenchError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// A migration failed to apply or roll back.
    #[error("Migration '{name}' failed: {source}")]
    Migration {
        name: &'static str,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Value does not fit the column type.
    #[error("Value out of range for column '{column}': {value}")]
    OutOfRange { column: &'static str, value: i64 },
}

impl From<PostgreSQLBenchError> for StoreError {
    fn from(err: PostgreSQLBenchError) -> Self {
        StoreError::database(err)
    }
}
