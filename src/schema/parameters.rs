//! Schema parameters
//!
//! A parameter is a named scalar with a default, optionally typed. Data sets
//! override defaults through the `parameters` table, whose rows are
//! `Name | Value`. Comparisons can scale their right operand by a parameter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{schema_cell, DataType, Schema};
use crate::data::{Cell, DataError, DataResult, DataSet};

/// Table through which a data set supplies parameter values
pub const PARAMETERS_TABLE: &str = "parameters";
/// Key field of [`PARAMETERS_TABLE`]
pub const PARAMETER_NAME_FIELD: &str = "Name";
/// Data field of [`PARAMETERS_TABLE`]
pub const PARAMETER_VALUE_FIELD: &str = "Value";

/// Declaration of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(with = "schema_cell")]
    pub default: Cell,
    /// Supplied values failing this type are reported and ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

impl Parameter {
    pub fn new(default: impl Into<Cell>) -> Self {
        Self {
            default: default.into(),
            data_type: None,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// True when `value` may replace the default
    pub fn accepts(&self, value: &Cell) -> bool {
        self.data_type.as_ref().map_or(true, |t| t.accepts(value))
    }
}

/// Resolved parameter values for one data set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, Cell>,
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.values.get(name)
    }

    /// Returns a parameter's numeric value; `None` if absent or not a number
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Cell::as_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Cell)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, Cell)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Schema {
    /// Resolves every declared parameter against `data`.
    ///
    /// Defaults apply unless the `parameters` table supplies a value that
    /// passes the parameter's data type. For a name given more than once,
    /// only the first row counts. Rows naming undeclared parameters are
    /// ignored.
    pub fn full_parameters(&self, data: &DataSet) -> DataResult<Parameters> {
        let mut values: BTreeMap<String, Cell> = self
            .parameters
            .iter()
            .map(|(name, p)| (name.clone(), p.default.clone()))
            .collect();
        if self.parameters.is_empty() {
            return Ok(Parameters { values });
        }

        let mut supplied: BTreeMap<String, Cell> = BTreeMap::new();
        for (position, row) in data.rows(PARAMETERS_TABLE).iter().enumerate() {
            let name = row
                .get(PARAMETER_NAME_FIELD)
                .ok_or_else(|| DataError::MissingKeyField {
                    table: PARAMETERS_TABLE.to_string(),
                    position,
                    field: PARAMETER_NAME_FIELD.to_string(),
                })?;
            let Some(name) = name.as_text() else { continue };
            if supplied.contains_key(name) || !self.parameters.contains_key(name) {
                continue;
            }
            let value = row.get(PARAMETER_VALUE_FIELD).cloned().unwrap_or(Cell::Null);
            supplied.insert(name.to_string(), value);
        }

        for (name, value) in supplied {
            let accepted = self.parameters.get(&name).map_or(false, |p| p.accepts(&value));
            if accepted {
                values.insert(name, value);
            } else {
                debug!(parameter = %name, value = %value, "supplied parameter ignored");
            }
        }
        Ok(Parameters { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::row;
    use crate::schema::NumberRange;
    use serde_json::json;

    const FACTOR: &str = "Minimum Nutrition Adjustment Factor";

    fn schema() -> Schema {
        Schema::builder()
            .table("categories", &["Name"], &["Min Nutrition"])
            .parameter(
                FACTOR,
                Parameter::new(0).with_data_type(DataType::numeric(NumberRange::default())),
            )
            .parameter("Label", Parameter::new("diet"))
            .build()
            .unwrap()
    }

    fn supplied(rows: Vec<crate::data::Row>) -> DataSet {
        DataSet::new().with_table(PARAMETERS_TABLE, rows)
    }

    #[test]
    fn test_defaults_without_rows() {
        let params = schema().full_parameters(&DataSet::new()).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.number(FACTOR), Some(0.0));
        assert_eq!(params.get("Label"), Some(&Cell::from("diet")));
    }

    #[test]
    fn test_supplied_value_overrides_default() {
        let data = supplied(vec![
            row([("Name", Cell::from(FACTOR)), ("Value", Cell::from(0.75))]),
            row([("Name", Cell::from(FACTOR)), ("Value", Cell::from(2))]),
        ]);
        let params = schema().full_parameters(&data).unwrap();
        assert_eq!(params.number(FACTOR), Some(0.75));
    }

    #[test]
    fn test_invalid_or_unknown_values_ignored() {
        let data = supplied(vec![
            row([("Name", Cell::from(FACTOR)), ("Value", Cell::from(-1))]),
            row([("Name", Cell::from("Unknown")), ("Value", Cell::from(5))]),
        ]);
        let params = schema().full_parameters(&data).unwrap();
        assert_eq!(params.number(FACTOR), Some(0.0));
        assert!(params.get("Unknown").is_none());
    }

    #[test]
    fn test_row_without_name_is_shape_error() {
        let data = supplied(vec![row([("Value", Cell::from(1))])]);
        let err = schema().full_parameters(&data).unwrap_err();
        assert_eq!(err.code(), "TAB_DATA_MISSING_KEY_FIELD");
    }

    #[test]
    fn test_parameter_json() {
        let p: Parameter = serde_json::from_value(json!({
            "default": "inf",
            "data_type": {"numbers": {"max": "inf", "inclusive_max": true}}
        }))
        .unwrap();
        assert_eq!(p.default, Cell::Number(f64::INFINITY));
        assert!(p.accepts(&Cell::from(3)));
        assert!(!p.accepts(&Cell::from("x")));
    }
}
