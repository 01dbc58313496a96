//! CLI argument definitions using clap
//!
//! Commands:
//! - tabcheck check --schema <path> --data <path> [--config <path>] [--only ...] [--verbosity ...]
//! - tabcheck schema --schema <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::checker::{CheckKind, Verbosity};

/// tabcheck - A strict, deterministic integrity checker for tabular data sets
#[derive(Parser, Debug)]
#[command(name = "tabcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a data set against a schema
    Check {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,

        /// Path to the data set file
        #[arg(long)]
        data: PathBuf,

        /// Path to a check configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Run only these checks
        #[arg(long, value_enum, value_delimiter = ',')]
        only: Vec<CheckKind>,

        /// Detail level of foreign-key failures
        #[arg(long, value_enum)]
        verbosity: Option<Verbosity>,
    },

    /// Validate a schema file and summarize it
    Schema {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::try_parse_from([
            "tabcheck",
            "check",
            "--schema",
            "diet.json",
            "--data",
            "data.json",
            "--only",
            "duplicates,foreign-keys",
            "--verbosity",
            "high",
        ])
        .unwrap();

        match cli.command {
            Command::Check {
                only, verbosity, config, ..
            } => {
                assert_eq!(only, vec![CheckKind::Duplicates, CheckKind::ForeignKeys]);
                assert_eq!(verbosity, Some(Verbosity::High));
                assert!(config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_requires_data() {
        assert!(Cli::try_parse_from(["tabcheck", "check", "--schema", "diet.json"]).is_err());
    }
}
