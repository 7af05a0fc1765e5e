//! Core harness for psql-bench.
//!
//! This crate provides the producer/consumer/reader machinery used to
//! measure insert throughput of a relational database:
//!
//! ```text
//!  LoadGenerator x M ──┐                          ┌── PeriodicReader (optional)
//!                      ▼                          │
//!            mpsc::channel(1) ──► Inserter x N ──►│ RecordStore
//!                                   │             │
//!                         CompletionSignal        │
//!                                   ▼             │
//!                                Harness ─────────┘
//! ```
//!
//! The database itself sits behind the [`RecordStore`] trait; the
//! PostgreSQL implementation lives in the `bench-postgresql` crate and
//! [`MemoryStore`] covers tests and dry runs.
//!
//! # Example
//!
//! ```rust
//! use bench_core::{Harness, HarnessConfig, MemoryStore, Variant};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let config = HarnessConfig::new(Variant::AutoIncrement)
//!     .with_workers(2)
//!     .with_generators(3)
//!     .with_records_per_generator(10);
//! let report = Harness::new(config, Arc::new(MemoryStore::new()))
//!     .run()
//!     .await
//!     .unwrap();
//! assert_eq!(report.rows_inserted, 30);
//! # });
//! ```

pub mod args;
pub mod config;
pub mod duration;
pub mod error;
pub mod generator;
pub mod harness;
pub mod inserter;
pub mod memory;
pub mod model;
pub mod reader;
pub mod report;
pub mod store;

pub use args::HarnessArgs;
pub use config::HarnessConfig;
pub use error::{BenchError, BoxError, StoreError};
pub use generator::LoadGenerator;
pub use harness::Harness;
pub use inserter::{CompletionReason, CompletionSignal, Inserter, InserterState, InserterStats};
pub use memory::MemoryStore;
pub use model::{Record, TypeTag, Variant};
pub use reader::{PeriodicReader, ReaderStats};
pub use report::BenchReport;
pub use store::RecordStore;
