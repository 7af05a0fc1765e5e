//! Run report.

use crate::inserter::InserterStats;
use crate::model::Variant;
use crate::reader::ReaderStats;
use serde::Serialize;
use std::time::Duration;

/// Result of a completed benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    /// Variant that was benchmarked.
    pub variant: Variant,
    /// Table the rows went into.
    pub table: &'static str,
    /// Inserter workers launched.
    pub worker_count: usize,
    /// Load generators launched.
    pub generator_count: usize,
    /// Records produced by each generator.
    pub records_per_generator: u64,
    /// Rows inserted across all inserters.
    pub rows_inserted: u64,
    /// Wall-clock time from first generator launch to all inserters drained.
    #[serde(skip)]
    pub elapsed: Duration,
    /// `elapsed` in milliseconds, for the JSON report.
    pub duration_ms: u64,
    /// Idle periods reported by inserters while the run was in progress.
    pub idle_reports: u64,
    /// Per-inserter counters, ordered by worker id.
    pub inserters: Vec<InserterStats>,
    /// Reader counters, when a reader ran.
    pub reader: Option<ReaderStats>,
}

impl BenchReport {
    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.rows_inserted as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Benchmark Report: {} ({})\n\
             ================\n\
             Workers: {}\n\
             Generators: {} x {} records\n\
             Rows Inserted: {}\n\
             Elapsed: {:?} ({:.2} rows/sec)\n\
             Idle Reports: {}\n",
            self.variant,
            self.table,
            self.worker_count,
            self.generator_count,
            self.records_per_generator,
            self.rows_inserted,
            self.elapsed,
            self.rows_per_second(),
            self.idle_reports,
        );

        if let Some(reader) = &self.reader {
            summary.push_str(&format!(
                "Reader: {} polls, {} rows read (last poll: {})\n",
                reader.polls, reader.rows_read, reader.last_rows
            ));
        }

        summary
    }
}
