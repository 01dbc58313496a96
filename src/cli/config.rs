//! Check configuration file
//!
//! Every field is optional. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use super::errors::{CliError, CliResult};
use crate::checker::{CheckKind, CheckOptions, Verbosity};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Checks to run (default: all)
    #[serde(default = "default_checks")]
    pub checks: BTreeSet<CheckKind>,

    /// Foreign-key report detail (default: low)
    #[serde(default)]
    pub verbosity: Verbosity,

    /// Exit with status 2 when any issue is found (default: true)
    #[serde(default = "default_fail_on_issues")]
    pub fail_on_issues: bool,
}

fn default_checks() -> BTreeSet<CheckKind> {
    CheckKind::ALL.into_iter().collect()
}

fn default_fail_on_issues() -> bool {
    true
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            checks: default_checks(),
            verbosity: Verbosity::default(),
            fail_on_issues: default_fail_on_issues(),
        }
    }
}

impl CheckConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: CheckConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.checks.is_empty() {
            return Err(CliError::config_error("checks must name at least one check"));
        }
        Ok(())
    }

    /// Applies command-line overrides
    pub fn with_overrides(mut self, only: &[CheckKind], verbosity: Option<Verbosity>) -> Self {
        if !only.is_empty() {
            self.checks = only.iter().copied().collect();
        }
        if let Some(verbosity) = verbosity {
            self.verbosity = verbosity;
        }
        self
    }

    pub fn options(&self) -> CheckOptions {
        CheckOptions::only(self.checks.iter().copied()).with_verbosity(self.verbosity)
    }
}
