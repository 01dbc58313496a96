//! Cell values, key tuples and row identifiers
//!
//! A cell is a single scalar in a row: null, boolean, number or text.
//! Cells are totally ordered and hashable so they can be used as report keys:
//! - numbers compare by value, with `-0.0 == 0.0` and a single NaN
//! - variants order as Null < Bool < Number < Text

use serde::de::{self, Deserializer, Visitor};
use serde::ser::{SerializeSeq, SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Largest magnitude below which every integral f64 is exact
const MAX_EXACT_INT: f64 = 9.007_199_254_740_992e15;

/// A scalar value held by a row field
#[derive(Debug, Clone)]
pub enum Cell {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    /// Returns true for the null cell
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the numeric value, if this is a number.
    ///
    /// Booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value, if this is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type name for messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Bool(_) => "bool",
            Cell::Number(_) => "number",
            Cell::Text(_) => "string",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Cell::Null => 0,
            Cell::Bool(_) => 1,
            Cell::Number(_) => 2,
            Cell::Text(_) => 3,
        }
    }

    /// Canonical numeric form used for equality, ordering and hashing.
    fn canonical(n: f64) -> f64 {
        if n == 0.0 {
            0.0
        } else if n.is_nan() {
            f64::NAN
        } else {
            n
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cell {}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cell {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Cell::Null, Cell::Null) => Ordering::Equal,
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Number(a), Cell::Number(b)) => {
                Cell::canonical(*a).total_cmp(&Cell::canonical(*b))
            }
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Cell::Null => {}
            Cell::Bool(b) => b.hash(state),
            Cell::Number(n) => Cell::canonical(*n).to_bits().hash(state),
            Cell::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Formats a number the way it reads in source data: `3` not `3.0`.
fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "inf".into() } else { "-inf".into() }
    } else if n.is_nan() {
        "nan".into()
    } else if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<i32> for Cell {
    fn from(n: i32) -> Self {
        Cell::Number(f64::from(n))
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

impl TryFrom<&Value> for Cell {
    type Error = &'static str;

    /// Converts a JSON scalar. Arrays and objects are rejected with their
    /// JSON type name.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Cell::Null),
            Value::Bool(b) => Ok(Cell::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Cell::Number).ok_or("number"),
            Value::String(s) => Ok(Cell::Text(s.clone())),
            Value::Array(_) => Err("array"),
            Value::Object(_) => Err("object"),
        }
    }
}

impl From<&Cell> for Value {
    /// Same form as serialization: integral numbers as integers, non-finite
    /// numbers as `"inf"`, `"-inf"` or `"nan"`.
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Number(n) if !n.is_finite() => Value::String(format_number(*n)),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => Value::from(*n as i64),
            Cell::Number(n) => Value::from(*n),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Bool(b) => serializer.serialize_bool(*b),
            Cell::Number(n) if !n.is_finite() => serializer.serialize_str(&format_number(*n)),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                serializer.serialize_i64(*n as i64)
            }
            Cell::Number(n) => serializer.serialize_f64(*n),
            Cell::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CellVisitor;

        impl<'de> Visitor<'de> for CellVisitor {
            type Value = Cell;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "null, a boolean, a number or a string")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
                Ok(Cell::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Cell, E> {
                Ok(Cell::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Cell, E> {
                Ok(Cell::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
                Ok(Cell::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
                Ok(Cell::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cell, E> {
                Ok(Cell::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
                Ok(Cell::Text(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Cell, E> {
                Ok(Cell::Text(v))
            }
        }

        deserializer.deserialize_any(CellVisitor)
    }
}

/// An ordered tuple of cells: a primary-key value or a foreign-key value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyTuple(pub Vec<Cell>);

impl KeyTuple {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self(cells)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if any member is null
    pub fn has_null(&self) -> bool {
        self.0.iter().any(Cell::is_null)
    }
}

impl From<Cell> for KeyTuple {
    fn from(cell: Cell) -> Self {
        KeyTuple(vec![cell])
    }
}

impl From<&str> for KeyTuple {
    fn from(s: &str) -> Self {
        KeyTuple(vec![Cell::from(s)])
    }
}

impl From<String> for KeyTuple {
    fn from(s: String) -> Self {
        KeyTuple(vec![Cell::Text(s)])
    }
}

impl From<i32> for KeyTuple {
    fn from(n: i32) -> Self {
        KeyTuple(vec![Cell::from(n)])
    }
}

impl From<f64> for KeyTuple {
    fn from(n: f64) -> Self {
        KeyTuple(vec![Cell::Number(n)])
    }
}

/// Builds a key tuple from heterogeneous parts: `key!["milk", "fat"]`.
#[macro_export]
macro_rules! key {
    ($($cell:expr),+ $(,)?) => {
        $crate::data::KeyTuple::new(vec![$($crate::data::Cell::from($cell)),+])
    };
}

impl fmt::Display for KeyTuple {
    /// Single-field keys display as the bare value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.0.as_slice() {
            return write!(f, "{}", only);
        }
        write!(f, "(")?;
        for (i, cell) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match cell {
                Cell::Text(s) => write!(f, "{:?}", s)?,
                other => write!(f, "{}", other)?,
            }
        }
        write!(f, ")")
    }
}

impl Serialize for KeyTuple {
    /// Single-field keys serialize as the bare value, composite keys as arrays.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let [only] = self.0.as_slice() {
            return only.serialize(serializer);
        }
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for cell in &self.0 {
            seq.serialize_element(cell)?;
        }
        seq.end()
    }
}

/// Identifies a row in a report.
///
/// Tables with a primary key are identified by key value; keyless tables by
/// zero-based position in the supplied row sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowId {
    Key(KeyTuple),
    Position(usize),
}

impl RowId {
    pub fn key(&self) -> Option<&KeyTuple> {
        match self {
            RowId::Key(k) => Some(k),
            RowId::Position(_) => None,
        }
    }
}

impl From<KeyTuple> for RowId {
    fn from(key: KeyTuple) -> Self {
        RowId::Key(key)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Key(k) => write!(f, "{}", k),
            RowId::Position(p) => write!(f, "row #{}", p),
        }
    }
}

impl Serialize for RowId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowId::Key(k) => k.serialize(serializer),
            RowId::Position(p) => {
                let mut s = serializer.serialize_struct("RowId", 1)?;
                s.serialize_field("position", p)?;
                s.end()
            }
        }
    }
}
