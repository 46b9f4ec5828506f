//! Column model and persisted data categories.
//!
//! A record type declares its fields as [`FieldDef`]s. Once a table is bound
//! to a physical layout, each field becomes a [`Column`] carrying the
//! ordinal at which the store returns it in result rows.

use serde::{Deserialize, Serialize};

use crate::value::FieldType;

/// Persisted value kind of a column.
///
/// Every field type maps to exactly one category through
/// [`FieldType::CATEGORY`]. `Json` is the catch-all for structured values.
///
/// # Examples
///
/// ```
/// use sqlite_driver_core::DataCategory;
///
/// assert_eq!(DataCategory::of::<u32>(), DataCategory::Int);
/// assert_eq!(DataCategory::of::<u8>(), DataCategory::TinyInt);
/// assert_eq!(DataCategory::of::<Vec<String>>(), DataCategory::Json);
/// assert_eq!(DataCategory::Bool.sql_type(), "INT");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataCategory {
    /// 32/64-bit signed and unsigned integers.
    Int,
    /// 8/16-bit narrow integers.
    TinyInt,
    /// Floating point numbers.
    Float,
    /// Booleans, stored as `0`/`1`.
    Bool,
    /// UTF-8 text.
    Text,
    /// Anything else, stored as JSON text.
    Json,
}

impl DataCategory {
    /// Returns the category of a field type.
    pub fn of<T: FieldType>() -> Self {
        T::CATEGORY
    }

    /// Returns the SQL column type used in DDL for this category.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Int | Self::Bool => "INT",
            Self::TinyInt => "TINYINT",
            Self::Float => "REAL",
            Self::Text | Self::Json => "TEXT",
        }
    }
}

/// Target of a foreign key reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub column: String,
}

impl ForeignKey {
    /// Creates a reference to `table(column)`.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Declared field of a record type.
///
/// Built with [`FieldDef::of`] and refined with the trait builders. The
/// `record!` macro emits one per struct field.
///
/// # Examples
///
/// ```
/// use sqlite_driver_core::{DataCategory, FieldDef};
///
/// let id = FieldDef::of::<u32>("id").primary_key();
/// assert_eq!(id.category, DataCategory::Int);
/// assert!(id.primary_key);
///
/// let owner = FieldDef::of::<u32>("owner").not_null().references("users", "id");
/// assert!(owner.not_null);
/// assert_eq!(owner.foreign_key.unwrap().table, "users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Field name, also the column name.
    pub name: &'static str,
    /// Persisted category inferred from the field type.
    pub category: DataCategory,
    /// Rust type name of the field, for diagnostics.
    pub type_name: &'static str,
    /// Whether the column is the table's primary key.
    pub primary_key: bool,
    /// Whether the column rejects NULL.
    pub not_null: bool,
    /// Optional reference to another table's column.
    pub foreign_key: Option<ForeignKey>,
}

impl FieldDef {
    /// Declares a field of type `T`.
    pub fn of<T: FieldType>(name: &'static str) -> Self {
        Self {
            name,
            category: T::CATEGORY,
            type_name: std::any::type_name::<T>(),
            primary_key: false,
            not_null: false,
            foreign_key: None,
        }
    }

    /// Marks the field as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the field as `NOT NULL`.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Adds a foreign key reference to `table(column)`.
    #[must_use]
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.foreign_key = Some(ForeignKey::new(table, column));
        self
    }
}

/// A field bound to its physical position in a table.
///
/// `ordinal` is the index at which the store returns this column in
/// `SELECT *` rows of the owning table. Decoding reads by ordinal only, so
/// it must track the physical layout exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Physical position in result rows.
    pub ordinal: usize,
    /// Persisted category.
    pub category: DataCategory,
    /// Rust type name of the declaring field.
    pub type_name: &'static str,
    /// Primary key trait.
    pub primary_key: bool,
    /// Not-null trait.
    pub not_null: bool,
    /// Foreign key trait.
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// Binds a declared field to a physical ordinal.
    pub fn from_field(field: &FieldDef, ordinal: usize) -> Self {
        Self {
            name: field.name.to_string(),
            ordinal,
            category: field.category,
            type_name: field.type_name,
            primary_key: field.primary_key,
            not_null: field.not_null,
            foreign_key: field.foreign_key.clone(),
        }
    }

    /// Binds every field to its declaration position.
    pub fn from_fields(fields: &[FieldDef]) -> Vec<Self> {
        fields
            .iter()
            .enumerate()
            .map(|(ordinal, field)| Self::from_field(field, ordinal))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::value::Json;

    #[test]
    fn test_integer_categories() {
        assert_eq!(DataCategory::of::<i32>(), DataCategory::Int);
        assert_eq!(DataCategory::of::<i64>(), DataCategory::Int);
        assert_eq!(DataCategory::of::<u32>(), DataCategory::Int);
        assert_eq!(DataCategory::of::<u64>(), DataCategory::Int);
        assert_eq!(DataCategory::of::<u16>(), DataCategory::Int);
        assert_eq!(DataCategory::of::<i16>(), DataCategory::TinyInt);
        assert_eq!(DataCategory::of::<u8>(), DataCategory::TinyInt);
        assert_eq!(DataCategory::of::<i8>(), DataCategory::TinyInt);
    }

    #[test]
    fn test_scalar_categories() {
        assert_eq!(DataCategory::of::<f32>(), DataCategory::Float);
        assert_eq!(DataCategory::of::<f64>(), DataCategory::Json);
        assert_eq!(DataCategory::of::<String>(), DataCategory::Text);
        assert_eq!(DataCategory::of::<bool>(), DataCategory::Bool);
        assert_eq!(DataCategory::of::<Option<bool>>(), DataCategory::Bool);
    }

    #[test]
    fn test_json_fallback_categories() {
        assert_eq!(DataCategory::of::<Vec<u32>>(), DataCategory::Json);
        assert_eq!(
            DataCategory::of::<HashMap<String, i32>>(),
            DataCategory::Json
        );
        assert_eq!(DataCategory::of::<serde_json::Value>(), DataCategory::Json);
        assert_eq!(DataCategory::of::<Json<(u8, String)>>(), DataCategory::Json);
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(DataCategory::Int.sql_type(), "INT");
        assert_eq!(DataCategory::TinyInt.sql_type(), "TINYINT");
        assert_eq!(DataCategory::Float.sql_type(), "REAL");
        assert_eq!(DataCategory::Text.sql_type(), "TEXT");
        assert_eq!(DataCategory::Json.sql_type(), "TEXT");
    }

    #[test]
    fn test_columns_from_fields_use_declaration_order() {
        let fields = vec![
            FieldDef::of::<u32>("id").primary_key(),
            FieldDef::of::<String>("name").not_null(),
        ];
        let columns = Column::from_fields(&fields);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].ordinal, 0);
        assert!(columns[0].primary_key);
        assert_eq!(columns[1].ordinal, 1);
        assert!(columns[1].not_null);
        assert_eq!(columns[1].type_name, "alloc::string::String");
    }
}
