//! Benchmark orchestration.
//!
//! The harness wires generators, inserters and an optional reader
//! together:
//!
//! 1. start the reader (if enabled) before any load
//! 2. record the start instant
//! 3. spawn M generators onto a capacity-1 channel
//! 4. spawn N inserters draining that channel
//! 5. wait for a `Drained` completion from every inserter
//! 6. cancel the reader and the inserters
//! 7. compute elapsed time
//! 8. join every task and build the report
//!
//! Any worker failure during step 5 aborts the run and no report is
//! produced.

use crate::config::HarnessConfig;
use crate::error::BenchError;
use crate::generator::LoadGenerator;
use crate::inserter::{CompletionReason, CompletionSignal, Inserter, InserterStats};
use crate::model::Record;
use crate::reader::{PeriodicReader, ReaderStats};
use crate::report::BenchReport;
use crate::store::RecordStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type InserterResult = Result<Result<InserterStats, BenchError>, JoinError>;

/// Producer/consumer/reader benchmark driver.
pub struct Harness {
    config: HarnessConfig,
    store: Arc<dyn RecordStore>,
}

impl Harness {
    /// Create a harness running `config` against `store`.
    pub fn new(config: HarnessConfig, store: Arc<dyn RecordStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Run the benchmark once.
    pub async fn run(&self) -> Result<BenchReport, BenchError> {
        self.config.validate()?;
        let config = &self.config;
        let variant = config.variant;

        info!(
            "Starting benchmark on '{}': {} inserters, {} generators x {} records",
            variant.table_name(),
            config.worker_count,
            config.generator_count,
            config.records_per_generator
        );

        let reader_stop = CancellationToken::new();
        let mut readers: JoinSet<Result<ReaderStats, BenchError>> = JoinSet::new();
        if config.enable_reader {
            let reader = PeriodicReader::new(variant, self.store.clone())
                .with_interval(config.effective_reader_interval())
                .with_limit(config.read_limit);
            readers.spawn(reader.run(reader_stop.clone()));
        }

        let start = Instant::now();

        let (record_tx, record_rx) = mpsc::channel::<Record>(1);
        let mut generators = JoinSet::new();
        for id in 0..config.generator_count {
            let tx = record_tx.clone();
            let rng = self.generator_rng(id);
            let count = config.records_per_generator;
            generators.spawn(async move {
                let mut generator = LoadGenerator::new(id, variant, rng);
                generator.generate(count, &tx).await
            });
        }
        // The channel closes once the last generator drops its sender.
        drop(record_tx);

        let shared_rx = Arc::new(Mutex::new(record_rx));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let stop_inserters = CancellationToken::new();
        let mut inserters = JoinSet::new();
        for worker in 0..config.worker_count {
            let inserter = Inserter::new(
                worker,
                variant,
                self.store.clone(),
                shared_rx.clone(),
                done_tx.clone(),
            )
            .with_idle_timeout(config.idle_timeout);
            inserters.spawn(inserter.run(stop_inserters.clone()));
        }
        drop(done_tx);
        drop(shared_rx);

        let mut early_reader = None;
        let waited = wait_for_drained(
            config.worker_count,
            &mut done_rx,
            &mut inserters,
            &mut readers,
            &mut early_reader,
        )
        .await;

        reader_stop.cancel();
        stop_inserters.cancel();
        let elapsed = start.elapsed();

        let idle_reports = waited?;

        let mut generated = 0u64;
        while let Some(result) = generators.join_next().await {
            generated += result??;
        }

        let mut inserter_stats = Vec::with_capacity(config.worker_count);
        while let Some(result) = inserters.join_next().await {
            inserter_stats.push(result??);
        }
        inserter_stats.sort_by_key(|stats| stats.worker);

        let reader = match readers.join_next().await {
            Some(result) => Some(result??),
            None => early_reader,
        };

        let rows_inserted: u64 = inserter_stats.iter().map(|s| s.rows_inserted).sum();
        if rows_inserted != generated {
            warn!(
                "Generated {} records but inserted {} rows",
                generated, rows_inserted
            );
        }

        info!(
            "Benchmark complete: {} rows in {:?}",
            rows_inserted, elapsed
        );

        Ok(BenchReport {
            variant,
            table: variant.table_name(),
            worker_count: config.worker_count,
            generator_count: config.generator_count,
            records_per_generator: config.records_per_generator,
            rows_inserted,
            elapsed,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            idle_reports,
            inserters: inserter_stats,
            reader,
        })
    }

    fn generator_rng(&self, id: usize) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Block until `worker_count` distinct inserters have reported `Drained`.
///
/// Idle reports are counted but never complete a worker. Returns the
/// number of idle reports seen, or the first worker failure.
async fn wait_for_drained(
    worker_count: usize,
    done_rx: &mut mpsc::UnboundedReceiver<CompletionSignal>,
    inserters: &mut JoinSet<Result<InserterStats, BenchError>>,
    readers: &mut JoinSet<Result<ReaderStats, BenchError>>,
    early_reader: &mut Option<ReaderStats>,
) -> Result<u64, BenchError> {
    let mut drained = HashSet::new();
    let mut idle_reports = 0u64;

    while drained.len() < worker_count {
        tokio::select! {
            signal = done_rx.recv() => match signal {
                Some(CompletionSignal { worker, reason: CompletionReason::Drained }) => {
                    drained.insert(worker);
                    debug!("Inserter {} drained ({}/{})", worker, drained.len(), worker_count);
                }
                Some(CompletionSignal { reason: CompletionReason::Idle, .. }) => {
                    idle_reports += 1;
                }
                None => {
                    // Every inserter has dropped its sender; find out why.
                    return Err(match inserters.join_next().await {
                        Some(result) => inserter_exit_reason(result),
                        None => BenchError::WorkerExited(drained.len()),
                    });
                }
            },
            Some(result) = inserters.join_next() => {
                return Err(inserter_exit_reason(result));
            }
            Some(result) = readers.join_next() => {
                *early_reader = Some(result??);
            }
        }
    }

    Ok(idle_reports)
}

/// An inserter only returns early on failure.
fn inserter_exit_reason(result: InserterResult) -> BenchError {
    match result {
        Ok(Err(err)) => err,
        Ok(Ok(stats)) => BenchError::WorkerExited(stats.worker),
        Err(join) => BenchError::Join(join),
    }
}
