//! Programmatic schema construction
//!
//! Declarations may arrive in any order; they are attached to their tables
//! when [`SchemaBuilder::build`] runs, which then validates the whole schema.

use super::errors::{SchemaError, SchemaResult};
use super::parameters::{Parameter, PARAMETERS_TABLE, PARAMETER_NAME_FIELD, PARAMETER_VALUE_FIELD};
use super::predicate::RowPredicate;
use super::types::{DataType, ForeignKey, Schema, TableDef};
use crate::data::Cell;

/// Accumulates table, type, default, predicate and foreign-key declarations
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    description: Option<String>,
    tables: Vec<(String, TableDef)>,
    data_types: Vec<(String, String, DataType)>,
    default_values: Vec<(String, String, Cell)>,
    predicates: Vec<(String, RowPredicate)>,
    foreign_keys: Vec<ForeignKey>,
    parameters: Vec<(String, Parameter)>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a table with its primary-key fields and data fields
    pub fn table(mut self, name: &str, primary_key: &[&str], data_fields: &[&str]) -> Self {
        self.tables
            .push((name.to_string(), TableDef::new(primary_key, data_fields)));
        self
    }

    pub fn data_type(mut self, table: &str, field: &str, data_type: DataType) -> Self {
        self.data_types
            .push((table.to_string(), field.to_string(), data_type));
        self
    }

    pub fn default_value(mut self, table: &str, field: &str, value: impl Into<Cell>) -> Self {
        self.default_values
            .push((table.to_string(), field.to_string(), value.into()));
        self
    }

    pub fn predicate(mut self, table: &str, predicate: RowPredicate) -> Self {
        self.predicates.push((table.to_string(), predicate));
        self
    }

    /// `mapping` pairs are `(native_field, foreign_field)`
    pub fn foreign_key(mut self, native: &str, foreign: &str, mapping: &[(&str, &str)]) -> Self {
        self.foreign_keys
            .push(ForeignKey::new(native, foreign, mapping));
        self
    }

    /// Declares a parameter. The `parameters` table is added if missing.
    pub fn parameter(mut self, name: &str, parameter: Parameter) -> Self {
        self.parameters.push((name.to_string(), parameter));
        self
    }

    /// Assembles and validates the schema
    pub fn build(self) -> SchemaResult<Schema> {
        let mut schema = Schema {
            description: self.description,
            ..Schema::default()
        };

        for (name, table) in self.tables {
            if schema.tables.contains_key(&name) {
                return Err(SchemaError::duplicate_name("table", None, name));
            }
            schema.tables.insert(name, table);
        }

        for (table, field, data_type) in self.data_types {
            let def = schema
                .tables
                .get_mut(&table)
                .ok_or_else(|| SchemaError::unknown_table("data type", &table))?;
            def.data_types.insert(field, data_type);
        }

        for (table, field, value) in self.default_values {
            let def = schema
                .tables
                .get_mut(&table)
                .ok_or_else(|| SchemaError::unknown_table("default value", &table))?;
            def.default_values.insert(field, value);
        }

        for (table, predicate) in self.predicates {
            let def = schema
                .tables
                .get_mut(&table)
                .ok_or_else(|| SchemaError::unknown_table("predicate", &table))?;
            def.predicates.push(predicate);
        }

        if !self.parameters.is_empty() && !schema.tables.contains_key(PARAMETERS_TABLE) {
            schema.tables.insert(
                PARAMETERS_TABLE.to_string(),
                TableDef::new(&[PARAMETER_NAME_FIELD], &[PARAMETER_VALUE_FIELD]),
            );
        }
        for (name, parameter) in self.parameters {
            if schema.parameters.contains_key(&name) {
                return Err(SchemaError::duplicate_name("parameter", None, name));
            }
            schema.parameters.insert(name, parameter);
        }

        schema.foreign_keys = self.foreign_keys;
        schema.validate_structure()?;
        Ok(schema)
    }
}
