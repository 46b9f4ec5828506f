//! Additive schema reconciliation.
//!
//! For each declared record type the physical table is created if missing.
//! An existing table keeps its physical layout: declared fields are bound
//! to the positions the store reports, undeclared physical columns are left
//! in place and skipped, and missing fields are appended with
//! `ALTER TABLE … ADD COLUMN`. Columns are never dropped or reordered.

use std::collections::HashMap;

use sqlite_driver_core::{Column, Value};
use tracing::{info, warn};

use crate::catalog::{PhysicalColumn, table_columns};
use crate::error::Result;
use crate::schema::TableDecl;
use crate::store::Store;
use crate::table::TableMeta;

/// Summary of what reconciliation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tables created from scratch.
    pub created: Vec<String>,
    /// Existing tables that gained columns or carry undeclared ones.
    pub migrated: Vec<TableChange>,
    /// Existing tables that already matched their declaration.
    pub unchanged: Vec<String>,
}

impl MigrationReport {
    /// Returns `true` if no DDL was issued.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.migrated.iter().all(|t| t.added.is_empty())
    }
}

/// Column-level changes to one existing table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableChange {
    /// Table name.
    pub table: String,
    /// Columns appended by this run.
    pub added: Vec<String>,
    /// Physical columns with no declared field.
    pub orphaned: Vec<String>,
}

/// Result of reconciling one declaration.
pub(crate) enum Outcome {
    Created,
    Migrated(TableChange),
    Unchanged,
}

/// Creates or migrates the table for `decl`, returning the table bound to
/// its physical column positions.
///
/// `existing` is the set of table names already in the store.
pub(crate) fn reconcile(
    store: &dyn Store,
    decl: &TableDecl,
    existing: &[String],
) -> Result<(Box<dyn TableMeta>, Outcome)> {
    if !existing.iter().any(|name| name == decl.table) {
        let table = decl.build(decl.columns());
        table.create(store)?;
        info!(table = decl.table, columns = decl.fields.len(), "Created table");
        return Ok((table, Outcome::Created));
    }

    let physical = table_columns(store, decl.table)?;
    let (bound, missing, orphaned) = bind(decl, &physical);
    for name in &orphaned {
        warn!(
            table = decl.table,
            column = %name,
            "Physical column has no declared field; leaving it in place"
        );
    }

    let mut table = decl.build(bound);
    if missing.is_empty() {
        if orphaned.is_empty() {
            return Ok((table, Outcome::Unchanged));
        }
        let change = TableChange {
            table: decl.table.to_string(),
            added: Vec::new(),
            orphaned,
        };
        return Ok((table, Outcome::Migrated(change)));
    }

    let defaults: HashMap<&str, Value> = decl.default_values()?.into_iter().collect();
    let mut added = Vec::with_capacity(missing.len());
    for column in missing {
        if column.primary_key {
            warn!(
                table = decl.table,
                column = %column.name,
                "Cannot add a primary key to an existing table; adding a plain column"
            );
        }
        let default = if column.not_null {
            defaults.get(column.name.as_str()).filter(|v| !v.is_null()).cloned()
        } else {
            None
        };
        info!(
            table = decl.table,
            column = %column.name,
            ordinal = column.ordinal,
            "Adding column"
        );
        added.push(column.name.clone());
        table.create_column(store, column, default)?;
    }

    let change = TableChange {
        table: decl.table.to_string(),
        added,
        orphaned,
    };
    Ok((table, Outcome::Migrated(change)))
}

/// Splits a declaration against the physical layout into bound columns,
/// missing columns with appended ordinals, and orphaned physical names.
fn bind(decl: &TableDecl, physical: &[PhysicalColumn]) -> (Vec<Column>, Vec<Column>, Vec<String>) {
    let mut bound = Vec::new();
    let mut orphaned = Vec::new();
    for (x, col) in physical.iter().enumerate() {
        match decl.fields.iter().find(|f| f.name == col.name) {
            Some(field) => bound.push(Column::from_field(field, x)),
            None => orphaned.push(col.name.clone()),
        }
    }

    let mut next = physical.len();
    let mut missing = Vec::new();
    for field in &decl.fields {
        if physical.iter().any(|c| c.name == field.name) {
            continue;
        }
        missing.push(Column::from_field(field, next));
        next += 1;
    }
    (bound, missing, orphaned)
}
