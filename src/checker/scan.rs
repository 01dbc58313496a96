//! Row resolution shared by every check
//!
//! Each supplied row is resolved against its table definition:
//! - key fields must be present (otherwise the data set is malformed)
//! - absent data fields take the declared default, else null
//! - values are laid out in table field order
//!
//! Resolution happens for the whole data set before any check runs, so a
//! malformed row fails the operation before partial results exist. Schema
//! parameters are resolved at the same time.

use std::collections::{BTreeMap, HashSet};

use crate::data::{Cell, DataError, DataResult, DataSet, KeyTuple, Row, RowId};
use crate::schema::{Parameters, RowView, Schema, TableDef};

/// One row resolved to table field order
#[derive(Debug, Clone)]
pub(crate) struct ScannedRow {
    pub id: RowId,
    pub values: Vec<Cell>,
}

/// A schema table with its resolved rows
#[derive(Debug)]
pub(crate) struct ScannedTable<'s> {
    pub name: &'s str,
    pub def: &'s TableDef,
    pub fields: Vec<String>,
    pub rows: Vec<ScannedRow>,
}

impl<'s> ScannedTable<'s> {
    pub fn scan(name: &'s str, def: &'s TableDef, rows: &[Row]) -> DataResult<Self> {
        let fields = def.field_names();
        let key_len = def.primary_key.len();

        let mut scanned = Vec::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let mut values = Vec::with_capacity(fields.len());
            for (i, field) in fields.iter().enumerate() {
                let value = match row.get(field) {
                    Some(v) => v.clone(),
                    None if i < key_len => {
                        return Err(DataError::MissingKeyField {
                            table: name.to_string(),
                            position,
                            field: field.clone(),
                        })
                    }
                    None => def.default_values.get(field).cloned().unwrap_or(Cell::Null),
                };
                values.push(value);
            }

            let id = if key_len == 0 {
                RowId::Position(position)
            } else {
                RowId::Key(KeyTuple::new(values[..key_len].to_vec()))
            };
            scanned.push(ScannedRow { id, values });
        }

        Ok(Self {
            name,
            def,
            fields,
            rows: scanned,
        })
    }

    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// The first row for each primary key; every row of a keyless table.
    pub fn representatives(&self) -> Vec<&ScannedRow> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|row| match &row.id {
                RowId::Key(key) => seen.insert(key),
                RowId::Position(_) => true,
            })
            .collect()
    }

    pub fn view<'r>(&'r self, row: &'r ScannedRow) -> RowView<'r> {
        RowView::new(&self.fields, &row.values)
    }

    /// Projects a row onto the given field positions
    pub fn project(&self, row: &ScannedRow, positions: &[usize]) -> KeyTuple {
        KeyTuple::new(positions.iter().map(|&i| row.values[i].clone()).collect())
    }

    /// Rebuilds a field-name keyed row, defaults applied
    pub fn to_row(&self, row: &ScannedRow) -> Row {
        self.fields
            .iter()
            .cloned()
            .zip(row.values.iter().cloned())
            .collect()
    }
}

/// Every schema table resolved against a data set
#[derive(Debug)]
pub(crate) struct Scan<'s> {
    schema: &'s Schema,
    tables: BTreeMap<&'s str, ScannedTable<'s>>,
    parameters: Parameters,
}

impl<'s> Scan<'s> {
    /// Schema tables absent from the data set scan as empty.
    pub fn new(schema: &'s Schema, data: &DataSet) -> DataResult<Self> {
        let mut tables = BTreeMap::new();
        for (name, def) in &schema.tables {
            let table = ScannedTable::scan(name, def, data.rows(name))?;
            tables.insert(name.as_str(), table);
        }
        let parameters = schema.full_parameters(data)?;
        Ok(Self {
            schema,
            tables,
            parameters,
        })
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Parameter values in effect for this data set
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn table(&self, name: &str) -> Option<&ScannedTable<'s>> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &ScannedTable<'s>> {
        self.tables.values()
    }
}
