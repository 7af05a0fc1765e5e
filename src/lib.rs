//! psql-bench: command definitions and runners for the CLI.

pub mod cli;
pub mod run;

pub use cli::{Cli, Commands, RunTarget};
pub use run::{run_memory, run_migrate, run_postgresql, run_reset, write_report};
