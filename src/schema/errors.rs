//! Schema configuration errors
//!
//! Error codes:
//! - TAB_SCHEMA_UNKNOWN_TABLE
//! - TAB_SCHEMA_UNKNOWN_FIELD
//! - TAB_SCHEMA_DUPLICATE_NAME
//! - TAB_SCHEMA_FOREIGN_KEY_MISMATCH
//! - TAB_SCHEMA_INVALID_DATA_TYPE
//! - TAB_SCHEMA_INVALID_PREDICATE
//! - TAB_SCHEMA_MALFORMED
//!
//! All of these are raised when a schema is built, loaded or handed to a
//! checker, never while data is being scanned.

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// A table referenced by the schema is not defined
    UnknownTable,
    /// A field referenced by the schema is not defined on its table
    UnknownField,
    /// A table, field, predicate or link is declared twice
    DuplicateName,
    /// A foreign-key mapping is empty or inconsistent
    ForeignKeyMismatch,
    /// A data type or default value is invalid
    InvalidDataType,
    /// A row predicate is invalid
    InvalidPredicate,
    /// A schema file cannot be read or parsed
    Malformed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownTable => "TAB_SCHEMA_UNKNOWN_TABLE",
            SchemaErrorCode::UnknownField => "TAB_SCHEMA_UNKNOWN_FIELD",
            SchemaErrorCode::DuplicateName => "TAB_SCHEMA_DUPLICATE_NAME",
            SchemaErrorCode::ForeignKeyMismatch => "TAB_SCHEMA_FOREIGN_KEY_MISMATCH",
            SchemaErrorCode::InvalidDataType => "TAB_SCHEMA_INVALID_DATA_TYPE",
            SchemaErrorCode::InvalidPredicate => "TAB_SCHEMA_INVALID_PREDICATE",
            SchemaErrorCode::Malformed => "TAB_SCHEMA_MALFORMED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    table: Option<String>,
    field: Option<String>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            table: None,
            field: None,
        }
    }

    fn in_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// `context` says what referenced the table
    pub fn unknown_table(context: &str, table: impl Into<String>) -> Self {
        let table = table.into();
        Self::new(
            SchemaErrorCode::UnknownTable,
            format!("{} references unknown table '{}'", context, table),
        )
        .in_table(table)
    }

    pub fn unknown_field(context: &str, table: impl Into<String>, field: impl Into<String>) -> Self {
        let table = table.into();
        let field = field.into();
        Self::new(
            SchemaErrorCode::UnknownField,
            format!("{} references unknown field '{}' of table '{}'", context, field, table),
        )
        .in_table(table)
        .on_field(field)
    }

    /// `what` names the kind of thing declared twice
    pub fn duplicate_name(what: &str, table: Option<&str>, name: impl Into<String>) -> Self {
        let name = name.into();
        let message = match table {
            Some(t) => format!("{} '{}' is declared more than once in table '{}'", what, name, t),
            None => format!("{} '{}' is declared more than once", what, name),
        };
        let err = Self::new(SchemaErrorCode::DuplicateName, message);
        match table {
            Some(t) => err.in_table(t),
            None => err,
        }
    }

    pub fn foreign_key_mismatch(link: impl fmt::Display, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::ForeignKeyMismatch,
            format!("foreign key {}: {}", link, reason.into()),
        )
    }

    pub fn invalid_data_type(
        table: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let table = table.into();
        let field = field.into();
        Self::new(
            SchemaErrorCode::InvalidDataType,
            format!("field '{}' of table '{}': {}", field, table, reason.into()),
        )
        .in_table(table)
        .on_field(field)
    }

    pub fn invalid_predicate(
        table: impl Into<String>,
        predicate: &str,
        reason: impl Into<String>,
    ) -> Self {
        let table = table.into();
        Self::new(
            SchemaErrorCode::InvalidPredicate,
            format!("predicate '{}' of table '{}': {}", predicate, table, reason.into()),
        )
        .in_table(table)
    }

    /// Create an error for a malformed schema file
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::Malformed,
            format!("Malformed schema '{}': {}", path.into(), reason.into()),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the table involved, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the field involved, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[CONFIG] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaErrorCode::UnknownTable.code(), "TAB_SCHEMA_UNKNOWN_TABLE");
        assert_eq!(SchemaErrorCode::UnknownField.code(), "TAB_SCHEMA_UNKNOWN_FIELD");
        assert_eq!(
            SchemaErrorCode::ForeignKeyMismatch.code(),
            "TAB_SCHEMA_FOREIGN_KEY_MISMATCH"
        );
        assert_eq!(SchemaErrorCode::Malformed.code(), "TAB_SCHEMA_MALFORMED");
    }

    #[test]
    fn test_unknown_field_context() {
        let err = SchemaError::unknown_field("data type", "foods", "Price");
        assert_eq!(err.code(), SchemaErrorCode::UnknownField);
        assert_eq!(err.table(), Some("foods"));
        assert_eq!(err.field(), Some("Price"));
        assert!(err.message().contains("Price"));
    }

    #[test]
    fn test_display_includes_code() {
        let err = SchemaError::unknown_table("foreign key", "recipes");
        let display = err.to_string();
        assert!(display.starts_with("[CONFIG]"));
        assert!(display.contains("TAB_SCHEMA_UNKNOWN_TABLE"));
        assert!(display.contains("recipes"));
    }

    #[test]
    fn test_duplicate_without_table() {
        let err = SchemaError::duplicate_name("table", None, "foods");
        assert_eq!(err.table(), None);
        assert!(err.message().contains("foods"));
    }
}
