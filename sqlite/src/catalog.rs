//! Catalog introspection: which tables exist and how they are laid out.

use crate::command::Command;
use crate::error::Result;
use crate::filter::Filter;
use crate::sort::Sort;
use crate::store::Store;

/// A column as the store reports it, in physical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalColumn {
    /// Zero-based physical position.
    pub cid: usize,
    /// Column name.
    pub name: String,
    /// Declared type text, possibly empty.
    pub declared_type: String,
    /// Whether the column carries `NOT NULL`.
    pub not_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// Names of user tables, excluding SQLite's internal `sqlite_*` tables.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn table_names<S: Store + ?Sized>(store: &S) -> Result<Vec<String>> {
    let filter = Filter::new()
        .eq("type", "table")
        .not()
        .starts_with("name", "sqlite_");
    let cursor = Command::new()
        .select_columns(&["name"], "sqlite_master")
        .filter(&filter)
        .order_by(&Sort::asc("name"))
        .query(store)?;

    cursor
        .map(|row| row.string(0).map(str::to_string))
        .collect()
}

/// Physical columns of `table` in position order; empty if the table does
/// not exist.
///
/// # Errors
///
/// Returns an error if the pragma fails or reports an unexpected shape.
pub fn table_columns<S: Store + ?Sized>(store: &S, table: &str) -> Result<Vec<PhysicalColumn>> {
    let cursor = Command::new().table_info(table).query(store)?;

    // cid, name, type, notnull, dflt_value, pk
    let mut columns = cursor
        .map(|row| {
            Ok(PhysicalColumn {
                cid: usize::try_from(row.int64(0)?).unwrap_or_default(),
                name: row.string(1)?.to_string(),
                declared_type: row.string(2)?.to_string(),
                not_null: row.int64(3)? != 0,
                primary_key: row.int64(5)? != 0,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    columns.sort_by_key(|c| c.cid);
    Ok(columns)
}

/// Returns `true` if `table` exists.
///
/// # Errors
///
/// Returns an error if the catalog query fails.
pub fn table_exists<S: Store + ?Sized>(store: &S, table: &str) -> Result<bool> {
    Ok(table_names(store)?.iter().any(|name| name == table))
}
