//! The integrity checker
//!
//! Construction validates the schema; every configuration problem surfaces
//! there. Each check then resolves the data set against the schema and
//! reports what it finds. A data set that is not tabular for the schema
//! fails the check before any result is produced.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use tracing::info;

use super::report::{
    DataTypeReport, DuplicateReport, ForeignKeyReport, IntegrityReport, RowPredicateReport,
    UnrecognizedReport,
};
use super::scan::Scan;
use super::{data_types, duplicates, foreign_keys, predicates};
use crate::data::{DataResult, DataSet};
use crate::schema::{Schema, SchemaResult};

/// The four data-quality checks
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    Duplicates,
    DataTypes,
    ForeignKeys,
    Predicates,
}

impl CheckKind {
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Duplicates,
        CheckKind::DataTypes,
        CheckKind::ForeignKeys,
        CheckKind::Predicates,
    ];
}

/// Detail level of foreign-key failure reports
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Failing values and row ids
    #[default]
    Low,
    /// Also the full contents of each offending row
    High,
}

/// Selection for [`IntegrityChecker::check_all`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub checks: BTreeSet<CheckKind>,
    pub verbosity: Verbosity,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            checks: CheckKind::ALL.into_iter().collect(),
            verbosity: Verbosity::Low,
        }
    }
}

impl CheckOptions {
    pub fn only(checks: impl IntoIterator<Item = CheckKind>) -> Self {
        Self {
            checks: checks.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn includes(&self, kind: CheckKind) -> bool {
        self.checks.contains(&kind)
    }
}

/// Checks data sets against one schema
#[derive(Debug, Clone, Copy)]
pub struct IntegrityChecker<'s> {
    schema: &'s Schema,
}

impl<'s> IntegrityChecker<'s> {
    /// Validates `schema` and binds a checker to it.
    pub fn new(schema: &'s Schema) -> SchemaResult<Self> {
        schema.validate_structure()?;
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Primary keys occurring more than once, with their total counts.
    ///
    /// Tables with an empty primary key are skipped.
    #[tracing::instrument(skip_all)]
    pub fn find_duplicates(&self, data: &DataSet) -> DataResult<DuplicateReport> {
        let scan = Scan::new(self.schema, data)?;
        let report = duplicates::find(&scan);
        info!(tables = report.len(), keys = report.violation_count(), "duplicate check done");
        Ok(report)
    }

    /// Values failing their field's data type, grouped by bad value.
    ///
    /// Only the first row per primary key is checked.
    #[tracing::instrument(skip_all)]
    pub fn find_data_type_failures(&self, data: &DataSet) -> DataResult<DataTypeReport> {
        let scan = Scan::new(self.schema, data)?;
        let report = data_types::find(&scan);
        info!(fields = report.len(), rows = report.violation_count(), "data type check done");
        Ok(report)
    }

    /// Child rows whose mapped values have no matching parent row.
    #[tracing::instrument(skip(self, data))]
    pub fn find_foreign_key_failures(
        &self,
        data: &DataSet,
        verbosity: Verbosity,
    ) -> DataResult<ForeignKeyReport> {
        let scan = Scan::new(self.schema, data)?;
        let report = foreign_keys::find(&scan, &self.schema.foreign_keys, verbosity);
        info!(links = report.len(), rows = report.violation_count(), "foreign key check done");
        Ok(report)
    }

    /// Rows rejected by their table's predicates.
    ///
    /// Trivially satisfied predicates are never evaluated.
    #[tracing::instrument(skip_all)]
    pub fn find_data_row_failures(&self, data: &DataSet) -> DataResult<RowPredicateReport> {
        let scan = Scan::new(self.schema, data)?;
        let report = predicates::find(&scan);
        info!(
            predicates = report.len(),
            rows = report.violation_count(),
            "predicate check done"
        );
        Ok(report)
    }

    /// Tables and fields present in `data` that the schema does not declare
    pub fn find_unrecognized(&self, data: &DataSet) -> UnrecognizedReport {
        let mut report = UnrecognizedReport::default();

        for (name, rows) in data.iter() {
            let Some(def) = self.schema.table(name) else {
                report.tables.insert(name.to_string());
                continue;
            };
            let unknown: BTreeSet<String> = rows
                .iter()
                .flat_map(|row| row.keys())
                .filter(|field| !def.has_field(field))
                .cloned()
                .collect();
            if !unknown.is_empty() {
                report.fields.insert(name.to_string(), unknown);
            }
        }

        report
    }

    /// Runs the selected checks over one resolution of the data set
    #[tracing::instrument(skip_all, fields(checks = options.checks.len()))]
    pub fn check_all(&self, data: &DataSet, options: &CheckOptions) -> DataResult<IntegrityReport> {
        let scan = Scan::new(self.schema, data)?;

        let report = IntegrityReport {
            duplicates: options
                .includes(CheckKind::Duplicates)
                .then(|| duplicates::find(&scan)),
            data_types: options
                .includes(CheckKind::DataTypes)
                .then(|| data_types::find(&scan)),
            foreign_keys: options.includes(CheckKind::ForeignKeys).then(|| {
                foreign_keys::find(&scan, &self.schema.foreign_keys, options.verbosity)
            }),
            predicates: options
                .includes(CheckKind::Predicates)
                .then(|| predicates::find(&scan)),
        };

        info!(
            clean = report.is_clean(),
            violations = report.violation_count(),
            "integrity check done"
        );
        Ok(report)
    }
}
