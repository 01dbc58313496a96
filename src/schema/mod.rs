//! Schema subsystem for tabcheck
//!
//! A schema is built once and is read-only thereafter. Every configuration
//! problem is reported when the schema is built or loaded, before any data
//! is scanned.
//!
//! # Design Principles
//!
//! - Explicit tagged facets for data types; no runtime reflection
//! - Predicates answer with an explicit outcome, never by raising
//! - Tautological predicates pass; contradictory ones are rejected
//! - Parameters resolve per data set, defaults first
//! - Deterministic validation order

mod builder;
mod errors;
mod loader;
mod parameters;
mod predicate;
mod types;
mod validator;

pub use builder::SchemaBuilder;
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use parameters::{
    Parameter, Parameters, PARAMETERS_TABLE, PARAMETER_NAME_FIELD, PARAMETER_VALUE_FIELD,
};
pub use predicate::{
    CompareOp, Comparison, CustomPredicate, Factor, FailureResponse, Operand, PredicateKind,
    PredicateOutcome, RowPredicate, RowView, Triviality,
};
pub use types::{
    case_space_normalized, parse_infinity, Cardinality, DataType, FieldMapping, ForeignKey,
    NumberRange, Schema, StringPolicy, TableDef,
};
