//! JSON data-set loading and writing
//!
//! Input is a JSON object keyed by table name, each value an array of rows.
//! - Object rows map field name to value
//! - Array rows are positional: primary-key fields, then data fields
//! - Table names match case-insensitively, with spaces equal to underscores
//! - Keys matching no schema table are kept under their own name
//! - Cells must be JSON scalars
//! - `"inf"` / `"-inf"` in a numeric field whose type rejects that string
//!   reads as an infinite number
//!
//! Written files use the same format and read back unchanged.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::cell::Cell;
use super::dataset::{DataSet, Row};
use super::errors::{DataError, DataResult};
use crate::schema::{case_space_normalized, parse_infinity, Schema, TableDef};

/// Builds data sets for a schema from JSON
pub struct DataLoader<'a> {
    schema: &'a Schema,
}

impl<'a> DataLoader<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Reads and converts a JSON data file
    pub fn load_file(&self, path: &Path) -> DataResult<DataSet> {
        let content = fs::read_to_string(path).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|source| DataError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let data = self.from_json(&value)?;
        debug!(
            path = %path.display(),
            tables = data.len(),
            rows = data.row_count(),
            "data set loaded"
        );
        Ok(data)
    }

    /// Converts a parsed JSON document
    pub fn from_json(&self, value: &Value) -> DataResult<DataSet> {
        let object = value
            .as_object()
            .ok_or_else(|| DataError::NotAnObject(json_type_name(value)))?;

        let mut matches: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut data = DataSet::new();

        for (key, rows) in object {
            let normalized = case_space_normalized(key);
            let matched = self
                .schema
                .table_names()
                .find(|t| case_space_normalized(t) == normalized);

            match matched {
                Some(table) => matches.entry(table).or_default().push(key.as_str()),
                None => {
                    warn!(table = %key, "data set table is not in the schema");
                    data.insert_table(key.clone(), convert_rows(key, None, rows)?);
                }
            }
        }

        for (table, keys) in matches {
            if keys.len() > 1 {
                return Err(DataError::AmbiguousTable {
                    table: table.to_string(),
                    keys: keys.iter().map(|k| k.to_string()).collect(),
                });
            }
            let def = self.schema.table(table);
            let rows = convert_rows(table, def, &object[keys[0]])?;
            data.insert_table(table, rows);
        }

        Ok(data)
    }

    /// Writes `data` as a JSON data file.
    ///
    /// Rows of schema tables holding exactly the declared fields are written
    /// positionally, every other row as an object. Fails if the file exists
    /// and `allow_overwrite` is false.
    pub fn write_file(
        &self,
        data: &DataSet,
        path: &Path,
        allow_overwrite: bool,
    ) -> DataResult<()> {
        if !allow_overwrite && path.exists() {
            return Err(DataError::FileExists(path.display().to_string()));
        }
        let value = self.to_json(data)?;
        let content = serde_json::to_string_pretty(&value).map_err(|source| DataError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, content).map_err(|source| DataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(
            path = %path.display(),
            tables = data.len(),
            rows = data.row_count(),
            "data set written"
        );
        Ok(())
    }

    /// Converts a data set to the JSON document [`from_json`](Self::from_json) reads.
    pub fn to_json(&self, data: &DataSet) -> DataResult<Value> {
        let mut object = serde_json::Map::new();
        for (table, rows) in data.iter() {
            let def = self.schema.table(table);
            let fields = def.map(TableDef::field_names);
            let mut out = Vec::with_capacity(rows.len());
            for (position, row) in rows.iter().enumerate() {
                for (field, cell) in row {
                    if !survives_reload(def, field, cell) {
                        return Err(DataError::UnwritableCell {
                            table: table.to_string(),
                            position,
                            field: field.clone(),
                            value: cell.to_string(),
                        });
                    }
                }
                let positional = fields
                    .as_ref()
                    .filter(|f| f.len() == row.len() && f.iter().all(|n| row.contains_key(n)));
                out.push(match positional {
                    Some(order) => {
                        Value::Array(order.iter().map(|f| Value::from(&row[f])).collect())
                    }
                    None => Value::Object(
                        row.iter()
                            .map(|(field, cell)| (field.clone(), Value::from(cell)))
                            .collect(),
                    ),
                });
            }
            object.insert(table.to_string(), Value::Array(out));
        }
        Ok(Value::Object(object))
    }
}

/// The infinity a string cell stands for in `field`, if the loader converts it
fn restored_infinity(def: Option<&TableDef>, field: &str, text: &str) -> Option<f64> {
    let data_type = def?.data_types.get(field)?;
    data_type.numbers.as_ref()?;
    let n = parse_infinity(text)?;
    (!data_type.accepts(&Cell::from(text))).then_some(n)
}

fn survives_reload(def: Option<&TableDef>, field: &str, cell: &Cell) -> bool {
    match cell {
        Cell::Number(n) if !n.is_finite() => {
            restored_infinity(def, field, &cell.to_string()) == Some(*n)
        }
        Cell::Text(s) => restored_infinity(def, field, s).is_none(),
        _ => true,
    }
}

impl DataSet {
    /// Converts a JSON document for `schema`. See [`DataLoader`].
    pub fn from_json(value: &Value, schema: &Schema) -> DataResult<DataSet> {
        DataLoader::new(schema).from_json(value)
    }
}

fn convert_rows(table: &str, def: Option<&TableDef>, rows: &Value) -> DataResult<Vec<Row>> {
    let rows = rows.as_array().ok_or_else(|| DataError::TableNotArray {
        table: table.to_string(),
        actual: json_type_name(rows),
    })?;

    let fields = def.map(TableDef::field_names);
    rows.iter()
        .enumerate()
        .map(|(position, row)| convert_row(table, def, fields.as_deref(), position, row))
        .collect()
}

fn convert_row(
    table: &str,
    def: Option<&TableDef>,
    fields: Option<&[String]>,
    position: usize,
    value: &Value,
) -> DataResult<Row> {
    let cell = |field: &str, v: &Value| -> DataResult<Cell> {
        let cell = Cell::try_from(v).map_err(|actual| DataError::NonScalarCell {
            table: table.to_string(),
            position,
            field: field.to_string(),
            actual,
        })?;
        Ok(match cell {
            Cell::Text(s) => match restored_infinity(def, field, &s) {
                Some(n) => Cell::Number(n),
                None => Cell::Text(s),
            },
            other => other,
        })
    };

    match value {
        Value::Object(map) => map
            .iter()
            .map(|(field, v)| -> DataResult<(String, Cell)> {
                Ok((field.clone(), cell(field.as_str(), v)?))
            })
            .collect(),
        Value::Array(values) => {
            let fields = fields.ok_or_else(|| DataError::MalformedRow {
                table: table.to_string(),
                position,
                reason: "positional rows need a schema table to name their fields".into(),
            })?;
            if values.len() != fields.len() {
                return Err(DataError::RowArity {
                    table: table.to_string(),
                    position,
                    expected: fields.len(),
                    actual: values.len(),
                });
            }
            fields
                .iter()
                .zip(values)
                .map(|(field, v)| -> DataResult<(String, Cell)> {
                    Ok((field.clone(), cell(field.as_str(), v)?))
                })
                .collect()
        }
        other => Err(DataError::MalformedRow {
            table: table.to_string(),
            position,
            reason: format!("expected an object or array, got {}", json_type_name(other)),
        }),
    }
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
