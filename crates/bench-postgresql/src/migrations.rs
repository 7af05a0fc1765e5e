//! Embedded schema migrations.
//!
//! Applied migrations are recorded by name in `psql_bench_migrations`, so
//! `run` only applies the ones that are still pending. Each migration runs
//! in its own transaction together with its bookkeeping row.

use crate::error::PostgreSQLBenchError;
use std::collections::HashSet;
use tokio_postgres::Client;
use tracing::{debug, info};

/// Table tracking applied migrations.
pub const MIGRATIONS_TABLE: &str = "psql_bench_migrations";

/// One schema migration with its rollback.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub up: &'static str,
    pub down: &'static str,
}

/// All migrations, in application order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_create_models",
        up: include_str!("../migrations/0001_create_models.up.sql"),
        down: include_str!("../migrations/0001_create_models.down.sql"),
    },
    Migration {
        name: "0002_create_nanosecond_model",
        up: include_str!("../migrations/0002_create_nanosecond_model.up.sql"),
        down: include_str!("../migrations/0002_create_nanosecond_model.down.sql"),
    },
    Migration {
        name: "0003_create_recency_indexes",
        up: include_str!("../migrations/0003_create_recency_indexes.up.sql"),
        down: include_str!("../migrations/0003_create_recency_indexes.down.sql"),
    },
];

async fn ensure_migrations_table(client: &Client) -> Result<(), PostgreSQLBenchError> {
    client
        .batch_execute(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        ))
        .await?;
    Ok(())
}

async fn applied(client: &Client) -> Result<HashSet<String>, PostgreSQLBenchError> {
    let rows = client
        .query(&format!("SELECT name FROM {MIGRATIONS_TABLE}"), &[])
        .await?;
    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}

/// Apply every pending migration. Returns the names applied by this call.
pub async fn run(client: &mut Client) -> Result<Vec<&'static str>, PostgreSQLBenchError> {
    ensure_migrations_table(client).await?;
    let done = applied(client).await?;

    let mut newly_applied = Vec::new();
    for migration in MIGRATIONS {
        if done.contains(migration.name) {
            debug!("Migration {} already applied", migration.name);
            continue;
        }

        let wrap = |source| PostgreSQLBenchError::Migration {
            name: migration.name,
            source,
        };
        let tx = client.transaction().await.map_err(wrap)?;
        tx.batch_execute(migration.up).await.map_err(wrap)?;
        tx.execute(
            &format!("INSERT INTO {MIGRATIONS_TABLE} (name) VALUES ($1)"),
            &[&migration.name],
        )
        .await
        .map_err(wrap)?;
        tx.commit().await.map_err(wrap)?;

        info!("Applied migration {}", migration.name);
        newly_applied.push(migration.name);
    }

    Ok(newly_applied)
}

/// Roll back every applied migration in reverse order. Returns the names
/// rolled back by this call.
pub async fn reset(client: &mut Client) -> Result<Vec<&'static str>, PostgreSQLBenchError> {
    ensure_migrations_table(client).await?;
    let done = applied(client).await?;

    let mut rolled_back = Vec::new();
    for migration in MIGRATIONS.iter().rev() {
        if !done.contains(migration.name) {
            continue;
        }

        let wrap = |source| PostgreSQLBenchError::Migration {
            name: migration.name,
            source,
        };
        let tx = client.transaction().await.map_err(wrap)?;
        tx.batch_execute(migration.down).await.map_err(wrap)?;
        tx.execute(
            &format!("DELETE FROM {MIGRATIONS_TABLE} WHERE name = $1"),
            &[&migration.name],
        )
        .await
        .map_err(wrap)?;
        tx.commit().await.map_err(wrap)?;

        info!("Rolled back migration {}", migration.name);
        rolled_back.push(migration.name);
    }

    Ok(rolled_back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::Variant;

    #[test]
    fn test_migration_names_are_ordered_and_unique() {
        let names: Vec<&str> = MIGRATIONS.iter().map(|m| m.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_every_variant_table_is_created_and_dropped() {
        for variant in Variant::all() {
            let table = variant.table_name();
            let create = format!("CREATE TABLE IF NOT EXISTS {table} (");
            let drop = format!("DROP TABLE IF EXISTS {table};");
            assert!(
                MIGRATIONS.iter().any(|m| m.up.contains(&create)),
                "no migration creates {table}"
            );
            assert!(
                MIGRATIONS.iter().any(|m| m.down.contains(&drop)),
                "no migration drops {table}"
            );
        }
    }
}
