//! Command-line definitions.

use bench_core::HarnessArgs;
use bench_postgresql::{PostgreSQLConnectionArgs, PostgreSQLRunArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "psql-bench")]
#[command(about = "Insert throughput benchmark for PostgreSQL")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one benchmark and report the elapsed time
    Run {
        #[command(subcommand)]
        target: RunTarget,
    },

    /// Apply pending schema migrations
    Migrate {
        #[command(flatten)]
        connection: PostgreSQLConnectionArgs,
    },

    /// Roll back every applied schema migration
    Reset {
        #[command(flatten)]
        connection: PostgreSQLConnectionArgs,
    },
}

/// Store to run the benchmark against
#[derive(Subcommand)]
pub enum RunTarget {
    /// Benchmark a PostgreSQL database
    #[command(name = "postgresql")]
    PostgreSQL {
        #[command(flatten)]
        args: PostgreSQLRunArgs,
    },

    /// Benchmark the in-process store (no database required)
    Memory {
        #[command(flatten)]
        harness: HarnessArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::Variant;

    #[test]
    fn test_parse_postgresql_run() {
        let cli = Cli::parse_from([
            "psql-bench",
            "run",
            "postgresql",
            "--postgresql-connection-string",
            "postgres://u:p@db:5432/bench",
            "--connections",
            "8",
            "--truncate",
            "--variant",
            "identity",
            "--reader",
        ]);
        match cli.command {
            Commands::Run {
                target: RunTarget::PostgreSQL { args },
            } => {
                assert_eq!(
                    args.connection.postgresql_connection_string,
                    "postgres://u:p@db:5432/bench"
                );
                assert_eq!(args.connection.connections, 8);
                assert!(args.truncate);
                assert!(!args.skip_migrations);
                assert_eq!(args.harness.variant, Variant::Identity);
                assert!(args.harness.reader);
            }
            _ => panic!("Expected run postgresql"),
        }
    }

    #[test]
    fn test_parse_memory_run() {
        let cli = Cli::parse_from(["psql-bench", "run", "memory", "--workers", "2"]);
        match cli.command {
            Commands::Run {
                target: RunTarget::Memory { harness },
            } => assert_eq!(harness.workers, 2),
            _ => panic!("Expected run memory"),
        }
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let result = Cli::try_parse_from(["psql-bench", "run", "memory", "--variant", "serial"]);
        assert!(result.is_err());
    }
}
