//! Common CLI arguments shared by every run target.

use crate::config::HarnessConfig;
use crate::duration::parse_duration;
use crate::model::Variant;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Workload arguments shared by all `run` targets.
#[derive(Args, Clone, Debug)]
pub struct HarnessArgs {
    /// Number of inserter workers
    #[arg(long, default_value = "4")]
    pub workers: usize,

    /// Number of load generators
    #[arg(long, default_value = "10")]
    pub generators: usize,

    /// Records produced by each generator
    #[arg(long, default_value = "300")]
    pub records_per_generator: u64,

    /// Record variant to benchmark
    #[arg(long, value_enum, default_value = "auto-increment")]
    pub variant: Variant,

    /// Run a periodic reader alongside the inserts
    #[arg(long)]
    pub reader: bool,

    /// Reader poll interval (e.g. "500ms", "1s"); defaults per variant
    #[arg(long, value_parser = parse_duration)]
    pub reader_interval: Option<Duration>,

    /// Maximum rows fetched per reader poll
    #[arg(long, default_value = "1000")]
    pub read_limit: u32,

    /// Idle window after which an inserter reports inactivity
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub idle_timeout: Duration,

    /// Random seed for type tag selection (same seed = same tags)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the run report as JSON to this path
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Dry-run mode: validate configuration without touching the database
    #[arg(long)]
    pub dry_run: bool,
}

impl From<&HarnessArgs> for HarnessConfig {
    fn from(args: &HarnessArgs) -> Self {
        let mut config = HarnessConfig::new(args.variant)
            .with_workers(args.workers)
            .with_generators(args.generators)
            .with_records_per_generator(args.records_per_generator)
            .with_reader(args.reader)
            .with_read_limit(args.read_limit)
            .with_idle_timeout(args.idle_timeout);
        if let Some(interval) = args.reader_interval {
            config = config.with_reader_interval(interval);
        }
        if let Some(seed) = args.seed {
            config = config.with_seed(seed);
        }
        config
    }
}
