//! tabcheck - A strict, deterministic integrity checker for tabular data sets
//!
//! A [`schema::Schema`] declares tables, per-field data types, foreign keys
//! and named row predicates. A [`checker::IntegrityChecker`] bound to a
//! validated schema inspects a [`data::DataSet`] and reports:
//! - duplicate primary keys
//! - values failing their data type
//! - foreign-key references with no parent row
//! - rows rejected by a predicate
//!
//! Schema problems are errors raised before any data is read. Data that is
//! not tabular for the schema fails the check. Everything else is reported
//! as data.

pub mod checker;
pub mod cli;
pub mod data;
pub mod schema;
