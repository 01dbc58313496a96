//! Structural validation of a schema
//!
//! Validation semantics:
//! - Every table and field name is non-empty and unique within its scope
//! - Data types and default values name declared fields
//! - Data types are internally consistent (min <= max)
//! - Predicates have unique names and read only declared fields
//! - Predicates that can never hold are rejected
//! - Parameters have a `parameters(Name | Value)` table, a valid type and a
//!   default that passes it; comparisons name only declared parameters
//! - Foreign keys name declared tables and fields with a consistent,
//!   non-empty mapping
//!
//! Validation is deterministic: parameters, then tables in name order, then
//! foreign keys in declaration order. The first violation found is returned.

use std::collections::{BTreeMap, BTreeSet};

use super::errors::{SchemaError, SchemaResult};
use super::parameters::{Parameter, PARAMETERS_TABLE, PARAMETER_NAME_FIELD, PARAMETER_VALUE_FIELD};
use super::predicate::{PredicateKind, Triviality};
use super::types::{ForeignKey, Schema, TableDef};

impl Schema {
    /// Validates the schema structure itself (not a data set)
    pub fn validate_structure(&self) -> SchemaResult<()> {
        self.validate_parameters()?;
        for (name, table) in &self.tables {
            validate_table(name, table, &self.parameters)?;
        }

        let mut seen = BTreeSet::new();
        for fk in &self.foreign_keys {
            self.validate_foreign_key(fk)?;
            if !seen.insert(fk) {
                return Err(SchemaError::duplicate_name("foreign key", None, fk.to_string()));
            }
        }

        Ok(())
    }

    fn validate_parameters(&self) -> SchemaResult<()> {
        if self.parameters.is_empty() {
            return Ok(());
        }
        let table = self
            .table(PARAMETERS_TABLE)
            .ok_or_else(|| SchemaError::unknown_table("parameter", PARAMETERS_TABLE))?;
        if table.primary_key != [PARAMETER_NAME_FIELD] || table.data_fields != [PARAMETER_VALUE_FIELD]
        {
            return Err(SchemaError::malformed_schema(
                "<schema>",
                format!(
                    "table '{}' must have primary key [{}] and data field [{}]",
                    PARAMETERS_TABLE, PARAMETER_NAME_FIELD, PARAMETER_VALUE_FIELD
                ),
            ));
        }

        for (name, parameter) in &self.parameters {
            if name.trim().is_empty() {
                return Err(SchemaError::malformed_schema(
                    "<schema>",
                    "parameter names cannot be empty",
                ));
            }
            if let Some(data_type) = &parameter.data_type {
                data_type.validate().map_err(|reason| {
                    SchemaError::invalid_data_type(PARAMETERS_TABLE, name, reason)
                })?;
            }
            if !parameter.accepts(&parameter.default) {
                return Err(SchemaError::invalid_data_type(
                    PARAMETERS_TABLE,
                    name,
                    format!("default {} fails the parameter's data type", parameter.default),
                ));
            }
        }
        Ok(())
    }

    fn validate_foreign_key(&self, fk: &ForeignKey) -> SchemaResult<()> {
        let native = self
            .table(&fk.native_table)
            .ok_or_else(|| SchemaError::unknown_table("foreign key", &fk.native_table))?;
        let foreign = self
            .table(&fk.foreign_table)
            .ok_or_else(|| SchemaError::unknown_table("foreign key", &fk.foreign_table))?;

        if fk.mapping.is_empty() {
            return Err(SchemaError::foreign_key_mismatch(fk, "mapping is empty"));
        }

        let mut native_seen = BTreeSet::new();
        let mut foreign_seen = BTreeSet::new();
        for m in &fk.mapping {
            if !native.has_field(&m.native_field) {
                return Err(SchemaError::unknown_field(
                    "foreign key",
                    &fk.native_table,
                    &m.native_field,
                ));
            }
            if !foreign.has_field(&m.foreign_field) {
                return Err(SchemaError::unknown_field(
                    "foreign key",
                    &fk.foreign_table,
                    &m.foreign_field,
                ));
            }
            if !native_seen.insert(m.native_field.as_str()) {
                return Err(SchemaError::foreign_key_mismatch(
                    fk,
                    format!("native field '{}' is mapped more than once", m.native_field),
                ));
            }
            if !foreign_seen.insert(m.foreign_field.as_str()) {
                return Err(SchemaError::foreign_key_mismatch(
                    fk,
                    format!("foreign field '{}' is mapped more than once", m.foreign_field),
                ));
            }
        }

        Ok(())
    }
}

fn validate_table(
    name: &str,
    table: &TableDef,
    parameters: &BTreeMap<String, Parameter>,
) -> SchemaResult<()> {
    if name.trim().is_empty() {
        return Err(SchemaError::malformed_schema("<schema>", "table names cannot be empty"));
    }

    let mut fields = BTreeSet::new();
    for field in table.fields() {
        if field.trim().is_empty() {
            return Err(SchemaError::malformed_schema(
                "<schema>",
                format!("table '{}' has an empty field name", name),
            ));
        }
        if !fields.insert(field) {
            return Err(SchemaError::duplicate_name("field", Some(name), field));
        }
    }

    for (field, data_type) in &table.data_types {
        if !table.has_field(field) {
            return Err(SchemaError::unknown_field("data type", name, field));
        }
        data_type
            .validate()
            .map_err(|reason| SchemaError::invalid_data_type(name, field, reason))?;
    }

    for field in table.default_values.keys() {
        if table.is_key_field(field) {
            return Err(SchemaError::invalid_data_type(
                name,
                field,
                "primary key fields cannot have default values",
            ));
        }
        if !table.has_field(field) {
            return Err(SchemaError::unknown_field("default value", name, field));
        }
    }

    let mut predicate_names = BTreeSet::new();
    for predicate in &table.predicates {
        if predicate.name.trim().is_empty() {
            return Err(SchemaError::invalid_predicate(name, "", "name cannot be empty"));
        }
        if !predicate_names.insert(predicate.name.as_str()) {
            return Err(SchemaError::duplicate_name("predicate", Some(name), &predicate.name));
        }
        if let PredicateKind::Comparison(comparison) = &predicate.check {
            for field in comparison.referenced_fields() {
                if !table.has_field(field) {
                    let context = format!("predicate '{}'", predicate.name);
                    return Err(SchemaError::unknown_field(&context, name, field));
                }
            }
            if let Some(parameter) = comparison.referenced_parameter() {
                if !parameters.contains_key(parameter) {
                    return Err(SchemaError::invalid_predicate(
                        name,
                        &predicate.name,
                        format!("references unknown parameter '{}'", parameter),
                    ));
                }
            }
        }
        if predicate.triviality() == Triviality::Contradiction {
            return Err(SchemaError::invalid_predicate(
                name,
                &predicate.name,
                "can never be satisfied",
            ));
        }
    }

    Ok(())
}
