//! Declared record types, collected before the driver opens.
//!
//! A [`Schema`] lists the record types a [`Driver`](crate::Driver) should
//! map, in the order their tables are reconciled.
//!
//! # Example
//!
//! ```
//! use sqlite_driver::{Schema, record};
//!
//! record! {
//!     table = "users",
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: u32 => [primary_key()],
//!         pub money: u32,
//!     }
//! }
//!
//! let schema = Schema::new().with::<User>();
//! assert_eq!(schema.declarations()[0].table, "users");
//! ```

use std::any::TypeId;
use std::collections::HashSet;

use sqlite_driver_core::{Column, FieldDef, Record, Value, ValueError, validate_record};

use crate::error::{DriverError, Result};
use crate::table::{Table, TableMeta};

/// One declared record type.
#[derive(Debug, Clone)]
pub struct TableDecl {
    /// Identity of the record type.
    pub type_id: TypeId,
    /// Rust type name, for diagnostics.
    pub type_name: &'static str,
    /// Table name.
    pub table: &'static str,
    /// Declared fields in declaration order.
    pub fields: Vec<FieldDef>,
    defaults: fn() -> std::result::Result<Vec<(&'static str, Value)>, ValueError>,
    build: fn(Vec<Column>) -> Box<dyn TableMeta>,
}

impl TableDecl {
    /// Declaration for `R`.
    pub fn of<R: Record>() -> Self {
        Self {
            type_id: TypeId::of::<R>(),
            type_name: std::any::type_name::<R>(),
            table: R::TABLE,
            fields: R::fields(),
            defaults: default_values::<R>,
            build: build_table::<R>,
        }
    }

    /// Field values of `R::default()`, used as `DEFAULT` clauses when a
    /// not-null column is added to an existing table.
    ///
    /// # Errors
    ///
    /// Returns an error if a default value cannot be encoded.
    pub fn default_values(&self) -> Result<Vec<(&'static str, Value)>> {
        Ok((self.defaults)()?)
    }

    /// Builds the typed table over resolved `columns`.
    pub fn build(&self, columns: Vec<Column>) -> Box<dyn TableMeta> {
        (self.build)(columns)
    }

    /// Columns for a fresh table, ordinals in declaration order.
    pub fn columns(&self) -> Vec<Column> {
        Column::from_fields(&self.fields)
    }
}

fn default_values<R: Record>() -> std::result::Result<Vec<(&'static str, Value)>, ValueError> {
    R::default().values()
}

fn build_table<R: Record>(columns: Vec<Column>) -> Box<dyn TableMeta> {
    Box::new(Table::<R>::new(columns))
}

/// Ordered set of record declarations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    declarations: Vec<TableDecl>,
}

impl Schema {
    /// An empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the record type `R`.
    #[must_use]
    pub fn with<R: Record>(mut self) -> Self {
        self.declarations.push(TableDecl::of::<R>());
        self
    }

    /// Declarations in registration order.
    pub fn declarations(&self) -> &[TableDecl] {
        &self.declarations
    }

    /// Checks every declaration and rejects duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidRecord`] for the first declaration with
    /// problems, or [`DriverError::DuplicateTable`] when a table name or
    /// record type appears twice.
    pub fn validate(&self) -> Result<()> {
        let mut tables = HashSet::new();
        let mut types = HashSet::new();
        for decl in &self.declarations {
            let errors = validate_record(decl.table, &decl.fields);
            if !errors.is_empty() {
                return Err(DriverError::InvalidRecord {
                    table: decl.table.to_string(),
                    errors,
                });
            }
            if !tables.insert(decl.table) || !types.insert(decl.type_id) {
                return Err(DriverError::DuplicateTable(decl.table.to_string()));
            }
        }
        Ok(())
    }
}
