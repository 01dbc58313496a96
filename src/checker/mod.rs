//! Data-quality checks over a data set
//!
//! Four independent checks, each reporting every violation it finds:
//! - duplicate primary keys
//! - data-type failures per field
//! - foreign-key references with no parent
//! - rows rejected by named predicates
//!
//! Violations are results, never errors.

mod data_types;
mod duplicates;
mod foreign_keys;
mod integrity;
mod predicates;
mod report;
mod scan;

pub use integrity::{CheckKind, CheckOptions, IntegrityChecker, Verbosity};
pub use report::{
    DataTypeReport, DuplicateReport, FieldRef, ForeignKeyFailure, ForeignKeyReport,
    IntegrityReport, OffendingRows, PredicateFailure, PredicateRef, RowPredicateReport,
    TypeFailure, UnrecognizedReport,
};
