//! Command runners.

use anyhow::Context;
use bench_core::{BenchReport, Harness, HarnessArgs, HarnessConfig, MemoryStore, RecordStore};
use bench_postgresql::{
    connect_one, mask_connection_password, migrations, PostgreSQLConnectionArgs,
    PostgreSQLRunArgs, PostgreSQLStore,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Run the benchmark against PostgreSQL.
pub async fn run_postgresql(args: PostgreSQLRunArgs) -> anyhow::Result<Option<BenchReport>> {
    let config = HarnessConfig::from(&args.harness);
    config.validate()?;

    if args.harness.dry_run {
        log_dry_run(&config);
        info!(
            "[DRY-RUN] Connection: {}",
            mask_connection_password(&args.connection.postgresql_connection_string)
        );
        info!(
            "[DRY-RUN] Connections: {}, truncate: {}, migrations: {}",
            args.connection.connections,
            args.truncate,
            !args.skip_migrations
        );
        return Ok(None);
    }

    if !args.skip_migrations {
        run_migrate(&args.connection).await?;
    }

    let store = PostgreSQLStore::connect(
        &args.connection.postgresql_connection_string,
        args.connection.connections,
    )
    .await
    .context("Failed to connect to PostgreSQL")?;

    if args.truncate {
        store
            .truncate(config.variant)
            .await
            .with_context(|| format!("Failed to truncate '{}'", config.variant.table_name()))?;
    }

    let report = run_harness(config, Arc::new(store), &args.harness).await?;
    Ok(Some(report))
}

/// Run the benchmark against the in-process store.
pub async fn run_memory(harness: HarnessArgs) -> anyhow::Result<Option<BenchReport>> {
    let config = HarnessConfig::from(&harness);
    config.validate()?;

    if harness.dry_run {
        log_dry_run(&config);
        return Ok(None);
    }

    let report = run_harness(config, Arc::new(MemoryStore::new()), &harness).await?;
    Ok(Some(report))
}

/// Apply pending migrations.
pub async fn run_migrate(connection: &PostgreSQLConnectionArgs) -> anyhow::Result<()> {
    let mut client = connect_one(&connection.postgresql_connection_string)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let applied = migrations::run(&mut client)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations up to date ({} applied)", applied.len());
    Ok(())
}

/// Roll back all migrations.
pub async fn run_reset(connection: &PostgreSQLConnectionArgs) -> anyhow::Result<()> {
    let mut client = connect_one(&connection.postgresql_connection_string)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let rolled_back = migrations::reset(&mut client)
        .await
        .context("Failed to roll back migrations")?;
    info!("Rolled back {} migrations", rolled_back.len());
    Ok(())
}

async fn run_harness(
    config: HarnessConfig,
    store: Arc<dyn RecordStore>,
    args: &HarnessArgs,
) -> anyhow::Result<BenchReport> {
    let report = Harness::new(config, store)
        .run()
        .await
        .context("Benchmark run failed")?;

    info!("Elapsed time: {:?}", report.elapsed);
    info!("{:.2} rows/sec", report.rows_per_second());

    if let Some(path) = &args.report_json {
        write_report(&report, path)?;
        info!("Report written to {:?}", path);
    }

    Ok(report)
}

fn log_dry_run(config: &HarnessConfig) {
    info!(
        "[DRY-RUN] Would insert {} records into '{}' ({} generators x {}, {} inserters)",
        config.total_records(),
        config.variant.table_name(),
        config.generator_count,
        config.records_per_generator,
        config.worker_count
    );
    if config.enable_reader {
        info!(
            "[DRY-RUN] Reader every {:?}, {} rows per poll",
            config.effective_reader_interval(),
            config.read_limit
        );
    }
    info!("[DRY-RUN] Configuration validated successfully");
}

/// Write `report` as pretty JSON.
pub fn write_report(report: &BenchReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write report to {path:?}"))?;
    Ok(())
}
