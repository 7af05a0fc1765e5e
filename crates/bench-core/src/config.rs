//! Harness configuration.

use crate::error::BenchError;
use crate::inserter::DEFAULT_IDLE_TIMEOUT;
use crate::model::Variant;
use crate::reader::DEFAULT_READ_LIMIT;
use serde::Serialize;
use std::time::Duration;

/// Settings for one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct HarnessConfig {
    /// Number of inserter workers (N).
    pub worker_count: usize,
    /// Number of load generators (M).
    pub generator_count: usize,
    /// Records produced by each generator (R).
    pub records_per_generator: u64,
    /// Record variant to benchmark.
    pub variant: Variant,
    /// Whether to run a periodic reader alongside the load.
    pub enable_reader: bool,
    /// Reader poll interval; the variant default when unset.
    pub reader_interval: Option<Duration>,
    /// Maximum rows fetched per poll.
    pub read_limit: u32,
    /// Idle window after which an inserter reports inactivity.
    pub idle_timeout: Duration,
    /// Base seed for generator randomness; fresh entropy when unset.
    pub seed: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            generator_count: 10,
            records_per_generator: 300,
            variant: Variant::AutoIncrement,
            enable_reader: false,
            reader_interval: None,
            read_limit: DEFAULT_READ_LIMIT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Create a configuration for `variant` with the default workload.
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_generators(mut self, count: usize) -> Self {
        self.generator_count = count;
        self
    }

    pub fn with_records_per_generator(mut self, count: u64) -> Self {
        self.records_per_generator = count;
        self
    }

    /// Enable or disable the periodic reader.
    pub fn with_reader(mut self, enable: bool) -> Self {
        self.enable_reader = enable;
        self
    }

    pub fn with_reader_interval(mut self, interval: Duration) -> Self {
        self.reader_interval = Some(interval);
        self
    }

    pub fn with_read_limit(mut self, limit: u32) -> Self {
        self.read_limit = limit;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total number of records the run will insert.
    pub fn total_records(&self) -> u64 {
        self.generator_count as u64 * self.records_per_generator
    }

    /// Poll interval the reader will use.
    pub fn effective_reader_interval(&self) -> Duration {
        self.reader_interval
            .unwrap_or_else(|| self.variant.default_reader_interval())
    }

    /// Reject configurations that cannot run.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.worker_count == 0 {
            return Err(BenchError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(BenchError::Config(
                "idle timeout must be greater than zero".to_string(),
            ));
        }
        if self.enable_reader {
            if self.variant.recency_order().is_none() {
                return Err(BenchError::Config(format!(
                    "variant '{}' has no recency key and cannot be read periodically",
                    self.variant
                )));
            }
            if self.effective_reader_interval().is_zero() {
                return Err(BenchError::Config(
                    "reader interval must be greater than zero".to_string(),
                ));
            }
            if self.read_limit == 0 {
                return Err(BenchError::Config(
                    "read limit must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }
}
