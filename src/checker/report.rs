//! Check reports
//!
//! Every report omits empty categories: a table, field, link or predicate
//! with no violation has no entry at all. Reports serialize to JSON with
//! tuple-keyed maps written as arrays of entries.

use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::{Cell, KeyTuple, Row, RowId};
use crate::schema::{FieldMapping, ForeignKey};

/// Duplicate primary keys per table, with total occurrence counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateReport {
    tables: BTreeMap<String, BTreeMap<KeyTuple, usize>>,
}

impl DuplicateReport {
    pub(crate) fn insert(&mut self, table: &str, duplicates: BTreeMap<KeyTuple, usize>) {
        if !duplicates.is_empty() {
            self.tables.insert(table.to_string(), duplicates);
        }
    }

    /// Duplicated keys of a table with their counts
    pub fn get(&self, table: &str) -> Option<&BTreeMap<KeyTuple, usize>> {
        self.tables.get(table)
    }

    /// Occurrence count of a duplicated key
    pub fn count(&self, table: &str, key: &KeyTuple) -> Option<usize> {
        self.get(table).and_then(|keys| keys.get(key)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<KeyTuple, usize>)> {
        self.tables.iter().map(|(t, m)| (t.as_str(), m))
    }

    /// Number of tables with duplicates
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of duplicated keys across all tables
    pub fn violation_count(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }
}

impl Serialize for DuplicateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            key: &'a KeyTuple,
            count: usize,
        }

        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for (table, keys) in &self.tables {
            let entries: Vec<Entry<'_>> = keys
                .iter()
                .map(|(key, &count)| Entry { key, count })
                .collect();
            map.serialize_entry(table, &entries)?;
        }
        map.end()
    }
}

/// A `(table, field)` pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldRef {
    pub table: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(table: &str, field: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
        }
    }
}

/// Bad values of one field, each with the rows holding it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeFailure {
    bad_values: BTreeMap<Cell, Vec<RowId>>,
}

impl TypeFailure {
    pub(crate) fn record(&mut self, value: &Cell, row: RowId) {
        let rows = self.bad_values.entry(value.clone()).or_default();
        if !rows.contains(&row) {
            rows.push(row);
        }
    }

    /// Rows holding a given bad value
    pub fn rows_for(&self, value: &Cell) -> Option<&[RowId]> {
        self.bad_values.get(value).map(Vec::as_slice)
    }

    pub fn bad_values(&self) -> impl Iterator<Item = (&Cell, &[RowId])> {
        self.bad_values.iter().map(|(v, rows)| (v, rows.as_slice()))
    }

    /// Number of distinct bad values
    pub fn len(&self) -> usize {
        self.bad_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bad_values.is_empty()
    }

    /// Number of offending rows
    pub fn row_count(&self) -> usize {
        self.bad_values.values().map(Vec::len).sum()
    }
}

/// Data-type failures per `(table, field)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTypeReport {
    failures: BTreeMap<FieldRef, TypeFailure>,
}

impl DataTypeReport {
    /// Merges into any failure already recorded for the field
    pub(crate) fn insert(&mut self, field: FieldRef, failure: TypeFailure) {
        if failure.is_empty() {
            return;
        }
        let entry = self.failures.entry(field).or_default();
        for (value, rows) in failure.bad_values {
            for row in rows {
                entry.record(&value, row);
            }
        }
    }

    pub fn get(&self, table: &str, field: &str) -> Option<&TypeFailure> {
        self.failures.get(&FieldRef::new(table, field))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldRef, &TypeFailure)> {
        self.failures.iter()
    }

    /// Number of failing fields
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.failures.values().map(TypeFailure::row_count).sum()
    }
}

impl Serialize for DataTypeReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct BadValue<'a> {
            value: &'a Cell,
            rows: &'a [RowId],
        }

        #[derive(Serialize)]
        struct Entry<'a> {
            table: &'a str,
            field: &'a str,
            bad_values: Vec<BadValue<'a>>,
        }

        let mut seq = serializer.serialize_seq(Some(self.failures.len()))?;
        for (field, failure) in &self.failures {
            seq.serialize_element(&Entry {
                table: &field.table,
                field: &field.field,
                bad_values: failure
                    .bad_values()
                    .map(|(value, rows)| BadValue { value, rows })
                    .collect(),
            })?;
        }
        seq.end()
    }
}

/// Child rows referencing one missing parent value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffendingRows {
    pub row_ids: Vec<RowId>,
    /// Full row contents; only populated at high verbosity
    pub rows: Vec<Row>,
}

/// Missing parent values of one foreign key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKeyFailure {
    values: BTreeMap<KeyTuple, OffendingRows>,
}

impl ForeignKeyFailure {
    pub(crate) fn record(&mut self, value: KeyTuple, row_id: RowId, row: Option<Row>) {
        let entry = self.values.entry(value).or_default();
        entry.row_ids.push(row_id);
        if let Some(row) = row {
            entry.rows.push(row);
        }
    }

    /// Rows referencing a missing value
    pub fn rows_for(&self, value: &KeyTuple) -> Option<&OffendingRows> {
        self.values.get(value)
    }

    pub fn values(&self) -> impl Iterator<Item = (&KeyTuple, &OffendingRows)> {
        self.values.iter()
    }

    /// Number of distinct missing values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.values.values().map(|o| o.row_ids.len()).sum()
    }
}

/// Foreign-key failures per link
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForeignKeyReport {
    failures: BTreeMap<ForeignKey, ForeignKeyFailure>,
}

impl ForeignKeyReport {
    pub(crate) fn insert(&mut self, link: ForeignKey, failure: ForeignKeyFailure) {
        if !failure.is_empty() {
            self.failures.insert(link, failure);
        }
    }

    pub fn get(&self, link: &ForeignKey) -> Option<&ForeignKeyFailure> {
        self.failures.get(link)
    }

    /// Failures of every link from `native` to `foreign`
    pub fn between<'a>(
        &'a self,
        native: &'a str,
        foreign: &'a str,
    ) -> impl Iterator<Item = (&'a ForeignKey, &'a ForeignKeyFailure)> + 'a {
        self.failures
            .iter()
            .filter(move |(fk, _)| fk.native_table == native && fk.foreign_table == foreign)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ForeignKey, &ForeignKeyFailure)> {
        self.failures.iter()
    }

    /// Number of failing links
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.failures.values().map(ForeignKeyFailure::row_count).sum()
    }
}

impl Serialize for ForeignKeyReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Missing<'a> {
            value: &'a KeyTuple,
            rows: &'a [RowId],
            #[serde(skip_serializing_if = "<[Row]>::is_empty")]
            row_data: &'a [Row],
        }

        #[derive(Serialize)]
        struct Entry<'a> {
            native_table: &'a str,
            foreign_table: &'a str,
            mapping: &'a [FieldMapping],
            failures: Vec<Missing<'a>>,
        }

        let mut seq = serializer.serialize_seq(Some(self.failures.len()))?;
        for (fk, failure) in &self.failures {
            seq.serialize_element(&Entry {
                native_table: &fk.native_table,
                foreign_table: &fk.foreign_table,
                mapping: &fk.mapping,
                failures: failure
                    .values()
                    .map(|(value, offending)| Missing {
                        value,
                        rows: &offending.row_ids,
                        row_data: &offending.rows,
                    })
                    .collect(),
            })?;
        }
        seq.end()
    }
}

/// A `(table, predicate name)` pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PredicateRef {
    pub table: String,
    pub predicate: String,
}

impl PredicateRef {
    pub fn new(table: &str, predicate: &str) -> Self {
        Self {
            table: table.to_string(),
            predicate: predicate.to_string(),
        }
    }
}

/// Rows rejected by one predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateFailure {
    rows: Vec<RowId>,
    messages: BTreeMap<RowId, String>,
}

impl PredicateFailure {
    pub(crate) fn record(&mut self, row: RowId, message: Option<String>) {
        if let Some(message) = message {
            self.messages.insert(row.clone(), message);
        }
        self.rows.push(row);
    }

    /// Offending rows in data-set order
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    pub fn contains(&self, row: &RowId) -> bool {
        self.rows.contains(row)
    }

    /// Rejection message for a row, when the predicate reports messages
    pub fn message(&self, row: &RowId) -> Option<&str> {
        self.messages.get(row).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row-predicate failures per `(table, predicate)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPredicateReport {
    failures: BTreeMap<PredicateRef, PredicateFailure>,
}

impl RowPredicateReport {
    pub(crate) fn insert(&mut self, predicate: PredicateRef, failure: PredicateFailure) {
        if !failure.is_empty() {
            self.failures.insert(predicate, failure);
        }
    }

    pub fn get(&self, table: &str, predicate: &str) -> Option<&PredicateFailure> {
        self.failures.get(&PredicateRef::new(table, predicate))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PredicateRef, &PredicateFailure)> {
        self.failures.iter()
    }

    /// Number of failing predicates
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.failures.values().map(PredicateFailure::len).sum()
    }
}

impl Serialize for RowPredicateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Offender<'a> {
            row: &'a RowId,
            #[serde(skip_serializing_if = "Option::is_none")]
            message: Option<&'a str>,
        }

        #[derive(Serialize)]
        struct Entry<'a> {
            table: &'a str,
            predicate: &'a str,
            rows: Vec<Offender<'a>>,
        }

        let mut seq = serializer.serialize_seq(Some(self.failures.len()))?;
        for (pred, failure) in &self.failures {
            seq.serialize_element(&Entry {
                table: &pred.table,
                predicate: &pred.predicate,
                rows: failure
                    .rows()
                    .iter()
                    .map(|row| Offender {
                        row,
                        message: failure.message(row),
                    })
                    .collect(),
            })?;
        }
        seq.end()
    }
}

/// Data-set names the schema does not declare
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnrecognizedReport {
    /// Supplied tables absent from the schema
    pub tables: BTreeSet<String>,
    /// Per schema table, row fields it does not declare
    pub fields: BTreeMap<String, BTreeSet<String>>,
}

impl UnrecognizedReport {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.fields.is_empty()
    }
}

/// Results of a combined run; categories not selected are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<DuplicateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_types: Option<DataTypeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<ForeignKeyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicates: Option<RowPredicateReport>,
}

impl IntegrityReport {
    /// True when no selected check found anything
    pub fn is_clean(&self) -> bool {
        self.duplicates.as_ref().map_or(true, DuplicateReport::is_empty)
            && self.data_types.as_ref().map_or(true, DataTypeReport::is_empty)
            && self.foreign_keys.as_ref().map_or(true, ForeignKeyReport::is_empty)
            && self.predicates.as_ref().map_or(true, RowPredicateReport::is_empty)
    }

    /// Total offending keys and rows across categories
    pub fn violation_count(&self) -> usize {
        self.duplicates.as_ref().map_or(0, DuplicateReport::violation_count)
            + self.data_types.as_ref().map_or(0, DataTypeReport::violation_count)
            + self.foreign_keys.as_ref().map_or(0, ForeignKeyReport::violation_count)
            + self.predicates.as_ref().map_or(0, RowPredicateReport::violation_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key;
    use serde_json::json;

    #[test]
    fn test_empty_entries_are_omitted() {
        let mut dups = DuplicateReport::default();
        dups.insert("foods", BTreeMap::new());
        assert!(dups.is_empty());

        let mut types = DataTypeReport::default();
        types.insert(FieldRef::new("foods", "Cost"), TypeFailure::default());
        assert!(types.is_empty());
    }

    #[test]
    fn test_duplicate_json() {
        let mut dups = DuplicateReport::default();
        dups.insert("nutrition_quantities", BTreeMap::from([(key!["milk", "fat"], 2)]));
        assert_eq!(
            serde_json::to_value(&dups).unwrap(),
            json!({"nutrition_quantities": [{"key": ["milk", "fat"], "count": 2}]})
        );
    }

    #[test]
    fn test_type_failure_groups_by_value() {
        let mut failure = TypeFailure::default();
        failure.record(&Cell::from(""), RowId::Key(key!["chicken", "fat"]));
        failure.record(&Cell::from(""), RowId::Key(key!["beef", "fat"]));
        failure.record(&Cell::from(-1), RowId::Key(key!["milk", "fat"]));

        assert_eq!(failure.len(), 2);
        assert_eq!(failure.row_count(), 3);
        assert_eq!(failure.rows_for(&Cell::from("")).unwrap().len(), 2);

        let mut report = DataTypeReport::default();
        report.insert(FieldRef::new("nutrition_quantities", "Quantity"), failure);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value[0]["field"], json!("Quantity"));
        assert_eq!(value[0]["bad_values"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_foreign_key_json_skips_row_data_at_low_verbosity() {
        let fk = ForeignKey::new("nutrition_quantities", "foods", &[("Food", "Name")]);
        let mut failure = ForeignKeyFailure::default();
        failure.record(key!["pizza"], RowId::Key(key!["pizza", "fat"]), None);
        let mut report = ForeignKeyReport::default();
        report.insert(fk.clone(), failure);

        let value = serde_json::to_value(&report).unwrap();
        let missing = &value[0]["failures"][0];
        assert_eq!(missing["value"], json!("pizza"));
        assert!(missing.get("row_data").is_none());
        assert_eq!(report.between("nutrition_quantities", "foods").count(), 1);
        assert_eq!(report.violation_count(), 1);
    }

    #[test]
    fn test_predicate_messages() {
        let mut failure = PredicateFailure::default();
        failure.record(RowId::Key(key!["fat"]), Some("too small".into()));
        failure.record(RowId::Key(key!["salt"]), None);

        assert_eq!(failure.message(&RowId::Key(key!["fat"])), Some("too small"));
        assert_eq!(failure.message(&RowId::Key(key!["salt"])), None);
        assert!(failure.contains(&RowId::Key(key!["salt"])));
    }

    #[test]
    fn test_integrity_report_clean() {
        let mut report = IntegrityReport {
            duplicates: Some(DuplicateReport::default()),
            ..IntegrityReport::default()
        };
        assert!(report.is_clean());

        let mut dups = DuplicateReport::default();
        dups.insert("foods", BTreeMap::from([(key!["milk"], 3)]));
        report.duplicates = Some(dups);
        assert!(!report.is_clean());
        assert_eq!(report.violation_count(), 1);
    }
}
