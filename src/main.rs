//! tabcheck CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Dispatches to CLI commands (via cli::run)
//! 2. Reports errors as a JSON error response and on stderr
//! 3. Exits 0 when clean, 2 when issues were found, 1 on failure
//!
//! All logic is delegated to the CLI module.

use std::process;

use tabcheck::cli;

fn main() {
    match cli::run() {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(e) => {
            if let Err(io) = cli::write_error(e.code_str(), e.message()) {
                eprintln!("failed to write error response: {}", io);
            }
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
