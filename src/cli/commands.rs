//! CLI command implementations
//!
//! Each command loads its inputs, runs, and writes exactly one JSON object
//! to stdout. Loading or validation failures are returned to the caller,
//! which reports them as error responses.

use std::path::Path;

use serde_json::{json, Value};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::checker::{CheckKind, IntegrityChecker, IntegrityReport, Verbosity};
use crate::data::DataLoader;
use crate::schema::{Schema, SchemaLoader};

use super::args::{Cli, Command};
use super::config::CheckConfig;
use super::errors::CliResult;
use super::io::{write_report, write_response};

/// How a successful command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Issues were found and the configuration asks to fail on them
    IssuesFound,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::IssuesFound => 2,
        }
    }
}

/// Installs the JSON tracing subscriber on stderr.
///
/// `RUST_LOG` overrides the default `tabcheck=warn` filter.
pub fn init_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "tabcheck=warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<Outcome> {
    init_logging();
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<Outcome> {
    match cmd {
        Command::Check {
            schema,
            data,
            config,
            only,
            verbosity,
        } => check(&schema, &data, config.as_deref(), &only, verbosity),
        Command::Schema { schema } => describe_schema(&schema),
    }
}

/// Checks a data file against a schema file and prints the report
pub fn check(
    schema_path: &Path,
    data_path: &Path,
    config_path: Option<&Path>,
    only: &[CheckKind],
    verbosity: Option<Verbosity>,
) -> CliResult<Outcome> {
    let config = match config_path {
        Some(path) => CheckConfig::load(path)?,
        None => CheckConfig::default(),
    }
    .with_overrides(only, verbosity);

    let schema = SchemaLoader::load_file(schema_path)?;
    let report = run_checks(&schema, data_path, &config)?;
    let clean = report.is_clean();

    write_report(clean, &report)?;

    if !clean && config.fail_on_issues {
        Ok(Outcome::IssuesFound)
    } else {
        Ok(Outcome::Success)
    }
}

/// Loads the data set and runs the configured checks
pub fn run_checks(
    schema: &Schema,
    data_path: &Path,
    config: &CheckConfig,
) -> CliResult<IntegrityReport> {
    let checker = IntegrityChecker::new(schema)?;
    let data = DataLoader::new(schema).load_file(data_path)?;

    let unrecognized = checker.find_unrecognized(&data);
    for (table, fields) in &unrecognized.fields {
        warn!(table = %table, fields = ?fields, "rows carry fields the schema does not declare");
    }

    let report = checker.check_all(&data, &config.options())?;
    info!(
        data = %data_path.display(),
        clean = report.is_clean(),
        "data set checked"
    );
    Ok(report)
}

/// Validates a schema file and prints its summary
pub fn describe_schema(schema_path: &Path) -> CliResult<Outcome> {
    let schema = SchemaLoader::load_file(schema_path)?;
    write_response(schema_summary(&schema))?;
    Ok(Outcome::Success)
}

/// Tables, links with cardinality, parameters, and names colliding after
/// case-space folding
pub fn schema_summary(schema: &Schema) -> Value {
    let tables: Vec<Value> = schema
        .tables
        .iter()
        .map(|(name, def)| {
            json!({
                "name": name,
                "primary_key": def.primary_key,
                "data_fields": def.data_fields,
                "predicates": def.predicates.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            })
        })
        .collect();

    let foreign_keys: Vec<Value> = schema
        .foreign_keys
        .iter()
        .filter_map(|fk| {
            let native = schema.table(&fk.native_table)?;
            Some(json!({
                "link": fk.to_string(),
                "native_table": fk.native_table,
                "foreign_table": fk.foreign_table,
                "cardinality": fk.cardinality(native),
            }))
        })
        .collect();

    json!({
        "description": schema.description,
        "tables": tables,
        "foreign_keys": foreign_keys,
        "parameters": schema.parameters,
        "case_space_duplicates": schema.find_case_space_duplicates(),
    })
}
