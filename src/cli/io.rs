//! JSON output handling for CLI
//!
//! - Output: single JSON object per invocation via stdout
//! - Diagnostics go to stderr through tracing
//! - UTF-8 only

use std::io::{self, Write};

use serde::Serialize;
use serde_json::{json, Value};

use super::errors::CliResult;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&json!({
        "status": "ok",
        "data": data
    }))
}

/// Write a check result to stdout
pub fn write_report<R: Serialize>(clean: bool, report: &R) -> CliResult<()> {
    let report = serde_json::to_value(report)?;
    write_value(&json!({
        "status": "ok",
        "clean": clean,
        "report": report
    }))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_value(&json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}

fn write_value(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
