//! Record declaration validation.
//!
//! Table and column names are interpolated into command text, so they are
//! restricted to plain identifiers before any command is built from them.
//!
//! # Examples
//!
//! ```
//! use sqlite_driver_core::*;
//!
//! let fields = vec![FieldDef::of::<u32>("id").primary_key()];
//! assert!(validate_record("users", &fields).is_empty());
//!
//! let bad = vec![FieldDef::of::<u32>("id; DROP TABLE users")];
//! assert!(!validate_record("users", &bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::types::FieldDef;

/// Record declaration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is not a plain identifier.
    #[error("invalid table name: '{0}'")]
    InvalidTableName(String),
    /// Field name is not a plain identifier.
    #[error("invalid field name: '{0}'")]
    InvalidFieldName(String),
    /// Record declares no fields.
    #[error("record for table '{0}' declares no fields")]
    NoFields(String),
    /// Two fields share a name.
    #[error("duplicate field: {0}")]
    DuplicateField(String),
    /// More than one field is marked as primary key.
    #[error("multiple primary keys: {0}")]
    MultiplePrimaryKeys(String),
    /// Foreign key target is not a plain identifier.
    #[error("invalid foreign key on '{field}': {target}")]
    InvalidForeignKey {
        /// Declaring field.
        field: String,
        /// Rendered `table(column)` target.
        target: String,
    },
}

/// Returns `true` if `name` is an ASCII letter or underscore followed by
/// ASCII alphanumerics or underscores.
///
/// # Examples
///
/// ```
/// use sqlite_driver_core::is_identifier;
///
/// assert!(is_identifier("user_id"));
/// assert!(is_identifier("_tmp2"));
/// assert!(!is_identifier("2fast"));
/// assert!(!is_identifier("name'--"));
/// assert!(!is_identifier(""));
/// ```
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a record declaration.
///
/// Returns every problem found; an empty vector means the declaration is
/// safe to render into commands.
pub fn validate_record(table: &str, fields: &[FieldDef]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !is_identifier(table) {
        errors.push(ValidationError::InvalidTableName(table.to_string()));
    }
    if fields.is_empty() {
        errors.push(ValidationError::NoFields(table.to_string()));
    }

    let mut seen = HashSet::new();
    let mut primary = Vec::new();
    for field in fields {
        if !is_identifier(field.name) {
            errors.push(ValidationError::InvalidFieldName(field.name.to_string()));
        }
        if !seen.insert(field.name) {
            errors.push(ValidationError::DuplicateField(field.name.to_string()));
        }
        if field.primary_key {
            primary.push(field.name);
        }
        if let Some(fk) = &field.foreign_key {
            if !is_identifier(&fk.table) || !is_identifier(&fk.column) {
                errors.push(ValidationError::InvalidForeignKey {
                    field: field.name.to_string(),
                    target: format!("{}({})", fk.table, fk.column),
                });
            }
        }
    }

    if primary.len() > 1 {
        errors.push(ValidationError::MultiplePrimaryKeys(primary.join(", ")));
    }

    errors
}
