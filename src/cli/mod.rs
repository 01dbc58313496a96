//! CLI module for tabcheck
//!
//! Provides command-line interface for:
//! - check: Check a data set against a schema
//! - schema: Validate and summarize a schema file

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    check, describe_schema, init_logging, run, run_checks, run_command, schema_summary, Outcome,
};
pub use config::CheckConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_report, write_response};
