//! Schema loader for JSON schema files
//!
//! - One schema per file
//! - Only declarative predicates can be stored; closures exist in memory only
//! - Malformed or structurally invalid files fail the load
//! - Saving never overwrites an existing file

use std::fs;
use std::path::Path;

use tracing::debug;

use super::errors::{SchemaError, SchemaResult};
use super::types::Schema;

/// Reads and writes schema files
pub struct SchemaLoader;

impl SchemaLoader {
    /// Loads and validates a schema file.
    pub fn load_file(path: &Path) -> SchemaResult<Schema> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema = Self::from_json_str(&content, &path.display().to_string())?;
        debug!(
            path = %path.display(),
            tables = schema.tables.len(),
            foreign_keys = schema.foreign_keys.len(),
            "schema loaded"
        );
        Ok(schema)
    }

    /// Parses and validates a schema from JSON text.
    ///
    /// `origin` names the source in error messages.
    pub fn from_json_str(content: &str, origin: &str) -> SchemaResult<Schema> {
        let schema: Schema = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed_schema(origin, format!("Invalid JSON: {}", e)))?;

        schema.validate_structure()?;
        Ok(schema)
    }

    /// Writes a schema file.
    ///
    /// Fails if the file already exists or the schema holds closure predicates.
    pub fn save_file(schema: &Schema, path: &Path) -> SchemaResult<()> {
        if path.exists() {
            return Err(SchemaError::malformed_schema(
                path.display().to_string(),
                "file already exists",
            ));
        }

        let content = serde_json::to_string_pretty(schema).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize schema: {}", e),
            )
        })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SchemaError::malformed_schema(
                    parent.display().to_string(),
                    format!("Failed to create directory: {}", e),
                )
            })?;
        }

        fs::write(path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::schema::errors::SchemaErrorCode;
    use crate::schema::predicate::{PredicateOutcome, RowPredicate};
    use crate::schema::types::DataType;
    use tempfile::TempDir;

    const DIET: &str = r#"{
        "tables": {
            "foods": {"primary_key": ["Name"], "data_fields": ["Cost"],
                      "data_types": {"Cost": {"numbers": {"min": 0, "max": "inf"}}}},
            "categories": {"primary_key": ["Name"], "data_fields": ["Min Nutrition", "Max Nutrition"],
                           "default_values": {"Max Nutrition": "inf"},
                           "predicates": [{"name": "Min Max Check",
                                           "check": {"comparison": {"left": "Max Nutrition", "op": ">=", "right": "Min Nutrition"}}}]},
            "nutrition_quantities": {"primary_key": ["Food", "Category"], "data_fields": ["Quantity"]}
        },
        "foreign_keys": [
            {"native_table": "nutrition_quantities", "foreign_table": "foods",
             "mapping": [{"native_field": "Food", "foreign_field": "Name"}]}
        ]
    }"#;

    #[test]
    fn test_from_json_str() {
        let schema = SchemaLoader::from_json_str(DIET, "diet").unwrap();
        assert_eq!(schema.tables.len(), 3);
        assert_eq!(schema.foreign_keys.len(), 1);
        let categories = schema.table("categories").unwrap();
        assert!(categories.predicate("Min Max Check").is_some());
        assert_eq!(
            categories.default_values["Max Nutrition"],
            Cell::Number(f64::INFINITY)
        );
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = SchemaLoader::from_json_str("{ not json", "broken").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);
        assert!(err.message().contains("broken"));
    }

    #[test]
    fn test_structural_errors_surface() {
        let json = r#"{"tables": {"foods": {"primary_key": ["Name"]}},
                       "foreign_keys": [{"native_table": "foods", "foreign_table": "recipes",
                                         "mapping": [{"native_field": "Name", "foreign_field": "Name"}]}]}"#;
        let err = SchemaLoader::from_json_str(json, "x").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownTable);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("schemas").join("diet.json");

        let schema = SchemaLoader::from_json_str(DIET, "diet").unwrap();
        SchemaLoader::save_file(&schema, &path).unwrap();

        let loaded = SchemaLoader::load_file(&path).unwrap();
        assert_eq!(loaded, schema);
    }

    #[test]
    fn test_save_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("diet.json");
        let schema = SchemaLoader::from_json_str(DIET, "diet").unwrap();

        SchemaLoader::save_file(&schema, &path).unwrap();
        assert!(SchemaLoader::save_file(&schema, &path).is_err());
    }

    #[test]
    fn test_save_rejects_closure_predicates() {
        let temp_dir = TempDir::new().unwrap();
        let schema = Schema::builder()
            .table("foods", &["Name"], &["Cost"])
            .data_type("foods", "Cost", DataType::number())
            .predicate("foods", RowPredicate::custom("any", |_| PredicateOutcome::Accepted))
            .build()
            .unwrap();

        let result = SchemaLoader::save_file(&schema, &temp_dir.path().join("s.json"));
        assert_eq!(result.unwrap_err().code(), SchemaErrorCode::Malformed);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = SchemaLoader::load_file(&temp_dir.path().join("absent.json")).unwrap_err();
        assert!(err.message().contains("Failed to read"));
    }
}
