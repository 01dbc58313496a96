//! Schema type definitions
//!
//! A schema is a set of table definitions plus foreign-key links:
//! - table: primary-key fields then data fields, in order
//! - data type: per-field numeric range, string policy, nullability, datetime
//! - default value: per data field, used when a row omits the field
//! - row predicate: named rule over a whole row
//! - foreign key: native (child) fields mapped onto foreign (parent) fields
//! - parameter: named scalar with a default, overridable per data set

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::builder::SchemaBuilder;
use super::parameters::Parameter;
use super::predicate::RowPredicate;
use crate::data::Cell;

/// Numeric facet of a data type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    #[serde(default = "zero", with = "bound")]
    pub min: f64,
    #[serde(default = "infinity", with = "bound")]
    pub max: f64,
    #[serde(default = "yes")]
    pub inclusive_min: bool,
    #[serde(default)]
    pub inclusive_max: bool,
    #[serde(default)]
    pub must_be_int: bool,
}

fn zero() -> f64 {
    0.0
}

fn infinity() -> f64 {
    f64::INFINITY
}

fn yes() -> bool {
    true
}

impl Default for NumberRange {
    /// `[0, +inf)`
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f64::INFINITY,
            inclusive_min: true,
            inclusive_max: false,
            must_be_int: false,
        }
    }
}

impl NumberRange {
    /// `[min, max)`; adjust inclusivity with the builder methods.
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    /// Any real number, infinities excluded
    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            inclusive_min: false,
            inclusive_max: false,
            must_be_int: false,
        }
    }

    pub fn inclusive_min(mut self, inclusive: bool) -> Self {
        self.inclusive_min = inclusive;
        self
    }

    pub fn inclusive_max(mut self, inclusive: bool) -> Self {
        self.inclusive_max = inclusive;
        self
    }

    pub fn integer(mut self) -> Self {
        self.must_be_int = true;
        self
    }

    pub fn contains(&self, n: f64) -> bool {
        if n.is_nan() || n < self.min || n > self.max {
            return false;
        }
        if !self.inclusive_min && n == self.min {
            return false;
        }
        if !self.inclusive_max && n == self.max {
            return false;
        }
        // +inf passes an integer check only as an inclusive infinite max
        if self.must_be_int
            && n.fract() != 0.0
            && !(n == f64::INFINITY && self.max == f64::INFINITY && self.inclusive_max)
        {
            return false;
        }
        true
    }
}

/// Reads `"inf"`, `"+inf"`, `"infinity"` and `"-inf"` (any case) as infinities
pub fn parse_infinity(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Serde for numeric bounds and constants: numbers, or the strings `"inf"` / `"-inf"`
pub(super) mod bound {
    use serde::de;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) => super::parse_infinity(&s)
                .ok_or_else(|| de::Error::custom(format!("invalid bound '{}'", s))),
        }
    }
}

/// Serde for schema-held cells: infinity strings decode as numbers.
///
/// `Cell` writes infinite numbers as `"inf"` / `"-inf"`; these modules read
/// them back as the same numbers.
pub(super) mod schema_cell {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::data::Cell;

    pub(crate) fn restore(cell: Cell) -> Cell {
        match cell {
            Cell::Text(s) => match super::parse_infinity(&s) {
                Some(n) => Cell::Number(n),
                None => Cell::Text(s),
            },
            other => other,
        }
    }

    pub fn serialize<S: Serializer>(value: &Cell, serializer: S) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cell, D::Error> {
        Cell::deserialize(deserializer).map(restore)
    }

    pub mod map {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &BTreeMap<String, Cell>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<BTreeMap<String, Cell>, D::Error> {
            let raw = BTreeMap::<String, Cell>::deserialize(deserializer)?;
            Ok(raw.into_iter().map(|(k, v)| (k, restore(v))).collect())
        }
    }
}

/// String facet of a data type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringPolicy {
    /// No string passes
    #[default]
    Forbidden,
    /// Every string passes
    Any,
    /// Only the listed flag strings pass
    OneOf(BTreeSet<String>),
}

/// Per-field data type constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
    /// `None` forbids numbers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbers: Option<NumberRange>,
    #[serde(default)]
    pub strings: StringPolicy,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub datetime: bool,
}

impl DataType {
    /// Non-null number in `[0, +inf)`
    pub fn number() -> Self {
        Self::numeric(NumberRange::default())
    }

    /// Non-null number within `range`
    pub fn numeric(range: NumberRange) -> Self {
        Self {
            numbers: Some(range),
            strings: StringPolicy::Forbidden,
            nullable: false,
            datetime: false,
        }
    }

    /// Any non-null string
    pub fn any_string() -> Self {
        Self {
            numbers: None,
            strings: StringPolicy::Any,
            nullable: false,
            datetime: false,
        }
    }

    /// One of an enumerated set of flag strings
    pub fn flags<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numbers: None,
            strings: StringPolicy::OneOf(allowed.into_iter().map(Into::into).collect()),
            nullable: false,
            datetime: false,
        }
    }

    /// A parseable date or timestamp string
    pub fn datetime() -> Self {
        Self {
            numbers: None,
            strings: StringPolicy::Forbidden,
            nullable: false,
            datetime: true,
        }
    }

    /// Also accept null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Replace the string policy, keeping the other facets
    pub fn with_strings(mut self, strings: StringPolicy) -> Self {
        self.strings = strings;
        self
    }

    /// Checks the type definition itself
    pub fn validate(&self) -> Result<(), String> {
        if let Some(range) = &self.numbers {
            if range.min.is_nan() || range.max.is_nan() {
                return Err("range bounds cannot be NaN".into());
            }
            if range.max < range.min {
                return Err(format!(
                    "max {} cannot be smaller than min {}",
                    Cell::Number(range.max),
                    Cell::Number(range.min)
                ));
            }
        }
        Ok(())
    }

    /// Returns whether `value` satisfies this type
    pub fn accepts(&self, value: &Cell) -> bool {
        match value {
            Cell::Null => self.nullable,
            _ if self.datetime => value.as_text().map_or(false, parses_as_datetime),
            Cell::Number(n) => self.numbers.as_ref().map_or(false, |r| r.contains(*n)),
            Cell::Text(s) => match &self.strings {
                StringPolicy::Forbidden => false,
                StringPolicy::Any => true,
                StringPolicy::OneOf(allowed) => allowed.contains(s),
            },
            Cell::Bool(_) => false,
        }
    }
}

fn parses_as_datetime(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Table definition: ordered key fields then ordered data fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub data_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data_types: BTreeMap<String, DataType>,
    #[serde(
        default,
        skip_serializing_if = "BTreeMap::is_empty",
        with = "schema_cell::map"
    )]
    pub default_values: BTreeMap<String, Cell>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<RowPredicate>,
}

impl TableDef {
    pub fn new(primary_key: &[&str], data_fields: &[&str]) -> Self {
        Self {
            primary_key: primary_key.iter().map(|s| s.to_string()).collect(),
            data_fields: data_fields.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// All fields, key fields first
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.primary_key
            .iter()
            .chain(self.data_fields.iter())
            .map(String::as_str)
    }

    /// Owned copy of [`fields`](Self::fields)
    pub fn field_names(&self) -> Vec<String> {
        self.fields().map(str::to_string).collect()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|f| f == field)
    }

    pub fn is_key_field(&self, field: &str) -> bool {
        self.primary_key.iter().any(|f| f == field)
    }

    /// True when the table has a primary key, and so a duplicate concept
    pub fn is_keyed(&self) -> bool {
        !self.primary_key.is_empty()
    }

    pub fn predicate(&self, name: &str) -> Option<&RowPredicate> {
        self.predicates.iter().find(|p| p.name == name)
    }
}

/// One native-to-foreign field pairing of a foreign key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldMapping {
    pub native_field: String,
    pub foreign_field: String,
}

/// Relationship shape of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
}

/// Reference from a native (child) table to a foreign (parent) table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignKey {
    pub native_table: String,
    pub foreign_table: String,
    pub mapping: Vec<FieldMapping>,
}

impl ForeignKey {
    /// `pairs` are `(native_field, foreign_field)`
    pub fn new(native_table: &str, foreign_table: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            native_table: native_table.to_string(),
            foreign_table: foreign_table.to_string(),
            mapping: pairs
                .iter()
                .map(|(n, f)| FieldMapping {
                    native_field: n.to_string(),
                    foreign_field: f.to_string(),
                })
                .collect(),
        }
    }

    pub fn native_fields(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().map(|m| m.native_field.as_str())
    }

    pub fn foreign_fields(&self) -> impl Iterator<Item = &str> {
        self.mapping.iter().map(|m| m.foreign_field.as_str())
    }

    /// One-to-one when the native fields are exactly the native primary key.
    pub fn cardinality(&self, native: &TableDef) -> Cardinality {
        let native_fields: BTreeSet<&str> = self.native_fields().collect();
        let key: BTreeSet<&str> = native.primary_key.iter().map(String::as_str).collect();
        if !key.is_empty() && native_fields == key {
            Cardinality::OneToOne
        } else {
            Cardinality::ManyToOne
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let native: Vec<&str> = self.native_fields().collect();
        let foreign: Vec<&str> = self.foreign_fields().collect();
        write!(
            f,
            "{}({}) -> {}({})",
            self.native_table,
            native.join(", "),
            self.foreign_table,
            foreign.join(", ")
        )
    }
}

/// Lower-cases a name and maps spaces to underscores.
///
/// Two names with the same normalized form are case-space duplicates.
pub fn case_space_normalized(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Complete schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Table definitions by name
    pub tables: BTreeMap<String, TableDef>,
    /// Foreign-key links
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    /// Parameter declarations by name, supplied through the `parameters` table
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
}

impl Schema {
    /// Starts a programmatic schema definition
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Finds, per table, the fields that collide once case and spaces are
    /// ignored. Tables without collisions are omitted.
    pub fn find_case_space_duplicates(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut result = BTreeMap::new();
        for (name, table) in &self.tables {
            let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
            for field in table.fields() {
                groups
                    .entry(case_space_normalized(field))
                    .or_default()
                    .insert(field.to_string());
            }
            let colliding: BTreeSet<String> = groups
                .into_values()
                .filter(|g| g.len() > 1)
                .flatten()
                .collect();
            if !colliding.is_empty() {
                result.insert(name.clone(), colliding);
            }
        }
        result
    }
}
