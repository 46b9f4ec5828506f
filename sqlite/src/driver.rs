//! The driver: one connection, one table per declared record type.
//!
//! Opening a driver reconciles every declared record type against the
//! store (see [`migration`](crate::migration)). Typed operations then
//! dispatch on the record type to the matching [`Table`].
//!
//! The driver owns a single `rusqlite` connection and takes no locks. It is
//! `Send` but not `Sync`; callers sharing one must serialize access.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::path::Path;

use rusqlite::Connection;
use sqlite_driver_core::Record;
use tracing::info;

use crate::catalog::{self, PhysicalColumn};
use crate::config::DriverConfig;
use crate::error::{DriverError, Result};
use crate::migration::{MigrationReport, Outcome, reconcile};
use crate::query::Query;
use crate::schema::Schema;
use crate::table::{Table, TableMeta};
use crate::update::UpdateOp;

/// Maps declared record types onto an SQLite database.
///
/// # Examples
///
/// ```
/// use rusqlite::Connection;
/// use sqlite_driver::{Driver, Filter, Schema, record};
///
/// record! {
///     table = "users",
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct User {
///         pub id: u32 => [primary_key()],
///         pub money: u32,
///     }
/// }
///
/// let conn = Connection::open_in_memory().unwrap();
/// let driver = Driver::open(conn, Schema::new().with::<User>()).unwrap();
///
/// driver.insert(&User { id: 1, money: 10 }).unwrap();
/// let user = driver.get::<User>(Filter::new().eq("id", 1)).unwrap();
/// assert_eq!(user, Some(User { id: 1, money: 10 }));
/// ```
pub struct Driver {
    conn: Connection,
    tables: Vec<Box<dyn TableMeta>>,
    by_type: HashMap<TypeId, usize>,
    report: MigrationReport,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("tables", &self.table_names())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Reconciles `schema` against `conn` and returns the driver.
    ///
    /// Tables are processed in declaration order. A failure part-way leaves
    /// the tables already processed as they are.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidRecord`] or
    /// [`DriverError::DuplicateTable`] for a bad schema, and
    /// [`DriverError::MigrationError`] if creating or altering a table fails.
    pub fn open(conn: Connection, schema: Schema) -> Result<Self> {
        schema.validate()?;
        let existing = catalog::table_names(&conn)?;

        let mut tables = Vec::with_capacity(schema.declarations().len());
        let mut by_type = HashMap::new();
        let mut report = MigrationReport::default();
        for decl in schema.declarations() {
            let (table, outcome) = reconcile(&conn, decl, &existing)?;
            match outcome {
                Outcome::Created => report.created.push(decl.table.to_string()),
                Outcome::Migrated(change) => report.migrated.push(change),
                Outcome::Unchanged => report.unchanged.push(decl.table.to_string()),
            }
            by_type.insert(decl.type_id, tables.len());
            tables.push(table);
        }

        info!(
            tables = tables.len(),
            created = report.created.len(),
            migrated = report.migrated.len(),
            "Driver ready"
        );
        Ok(Self {
            conn,
            tables,
            by_type,
            report,
        })
    }

    /// Opens the database file at `path` with default settings.
    ///
    /// # Errors
    ///
    /// See [`Driver::from_config`].
    pub fn open_path(path: impl AsRef<Path>, schema: Schema) -> Result<Self> {
        Self::from_config(&DriverConfig::new(path.as_ref()), schema)
    }

    /// Connects with `config` and reconciles `schema`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be opened or see
    /// [`Driver::open`].
    pub fn from_config(config: &DriverConfig, schema: Schema) -> Result<Self> {
        Self::open(config.connect()?, schema)
    }

    /// Closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DatabaseError`] if SQLite refuses to close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| DriverError::DatabaseError(err))
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// What reconciliation did at open.
    pub fn report(&self) -> &MigrationReport {
        &self.report
    }

    /// Registered tables in declaration order.
    pub fn tables(&self) -> impl Iterator<Item = &dyn TableMeta> {
        self.tables.iter().map(|t| &**t)
    }

    /// Registered table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables().map(|t| t.name()).collect()
    }

    /// Physical columns of any table in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub fn table_columns(&self, table: &str) -> Result<Vec<PhysicalColumn>> {
        catalog::table_columns(&self.conn, table)
    }

    /// The table mapped to `R`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::TableNotRegistered`] if `R` was not declared.
    pub fn table<R: Record>(&self) -> Result<&Table<R>> {
        self.by_type
            .get(&TypeId::of::<R>())
            .and_then(|&i| self.tables[i].as_any().downcast_ref::<Table<R>>())
            .ok_or(DriverError::TableNotRegistered(type_name::<R>()))
    }

    /// First `R` matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::get`].
    pub fn get<R: Record>(&self, query: impl Into<Query>) -> Result<Option<R>> {
        self.table::<R>()?.get(&self.conn, query)
    }

    /// Every `R` matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::all`].
    pub fn all<R: Record>(&self, query: impl Into<Query>) -> Result<Vec<R>> {
        self.table::<R>()?.all(&self.conn, query)
    }

    /// Inserts `record`.
    ///
    /// # Errors
    ///
    /// See [`Table::insert`].
    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        self.table::<R>()?.insert(&self.conn, record)
    }

    /// Applies `ops` to the `R` rows matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::update`].
    pub fn update<R: Record>(&self, ops: Vec<UpdateOp>, query: impl Into<Query>) -> Result<usize> {
        self.table::<R>()?.update(&self.conn, ops, query)
    }

    /// Overwrites the matching rows with the fields of `record`.
    ///
    /// # Errors
    ///
    /// See [`Table::update_value`].
    pub fn update_value<R: Record>(&self, record: &R, query: impl Into<Query>) -> Result<bool> {
        self.table::<R>()?.update_value(&self.conn, record, query)
    }

    /// Updates the matching rows or inserts `record`; `true` when inserted.
    ///
    /// # Errors
    ///
    /// See [`Table::upsert`].
    pub fn upsert<R: Record>(&self, record: &R, query: impl Into<Query>) -> Result<bool> {
        self.table::<R>()?.upsert(&self.conn, record, query)
    }

    /// Deletes the `R` rows matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::delete`].
    pub fn delete<R: Record>(&self, query: impl Into<Query>) -> Result<usize> {
        self.table::<R>()?.delete(&self.conn, query)
    }

    /// Returns `true` if any `R` row matches `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::has`].
    pub fn has<R: Record>(&self, query: impl Into<Query>) -> Result<bool> {
        self.table::<R>()?.has(&self.conn, query)
    }

    /// Number of `R` rows matching `query`.
    ///
    /// # Errors
    ///
    /// See [`Table::row_count`].
    pub fn row_count<R: Record>(&self, query: impl Into<Query>) -> Result<u64> {
        self.table::<R>()?.row_count(&self.conn, query)
    }

    /// 1-based rank of the first matching `R` row under the query's sort.
    ///
    /// # Errors
    ///
    /// See [`Table::row_position`].
    pub fn row_position<R: Record>(&self, query: impl Into<Query>) -> Result<Option<u64>> {
        self.table::<R>()?.row_position(&self.conn, query)
    }
}
