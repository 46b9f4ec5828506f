//! Typed CRUD over one mapped table.
//!
//! A [`Table`] binds a record type to its table name and resolved column
//! list. Every operation renders a [`Command`], runs it against a
//! [`Store`], and decodes rows through the table's [`Serializer`].
//!
//! Updates and deletes only look at a query's filter; sort and pagination
//! apply to reads.

use std::any::Any;

use sqlite_driver_core::{Column, Record, Value};

use crate::command::Command;
use crate::error::{DriverError, Result};
use crate::filter::Filter;
use crate::query::Query;
use crate::serializer::{Serializer, encode_value};
use crate::sort::{Sort, SortOperator, SortOrder};
use crate::store::{Cursor, Row, Store};
use crate::update::{UpdateKind, UpdateOp};

/// Type-erased view of a registered table.
pub trait TableMeta: Any + Send {
    /// Table name.
    fn name(&self) -> &str;

    /// Rust type name of the mapped record.
    fn record_type(&self) -> &'static str;

    /// Mapped columns in list order.
    fn columns(&self) -> &[Column];

    /// Issues `CREATE TABLE` for the mapped columns.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MigrationError`] if the statement fails.
    fn create(&self, store: &dyn Store) -> Result<()>;

    /// Adds `column` to the physical table and to the column list.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MigrationError`] if the statement fails.
    fn create_column(&mut self, store: &dyn Store, column: Column, default: Option<Value>)
    -> Result<()>;

    /// Upcast for downcasting to the concrete [`Table`].
    fn as_any(&self) -> &dyn Any;
}

/// A record type bound to its table.
#[derive(Debug, Clone)]
pub struct Table<R> {
    name: String,
    serializer: Serializer<R>,
}

impl<R: Record> Table<R> {
    /// Binds `R` to `columns`, whose ordinals must match the physical layout.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            name: R::TABLE.to_string(),
            serializer: Serializer::new(columns),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapped columns.
    pub fn columns(&self) -> &[Column] {
        self.serializer.columns()
    }

    /// The table's serializer.
    pub fn serializer(&self) -> &Serializer<R> {
        &self.serializer
    }

    /// `CREATE TABLE` with every mapped column.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MigrationError`] if the statement fails.
    pub fn create<S: Store + ?Sized>(&self, store: &S) -> Result<()> {
        Command::new()
            .create_table(&self.name, self.columns())
            .execute(store)
            .map_err(|err| ddl_error(&self.name, err))?;
        Ok(())
    }

    /// `ALTER TABLE … ADD COLUMN`, then appends the column and rebuilds the
    /// serializer.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MigrationError`] if the statement fails.
    pub fn create_column<S: Store + ?Sized>(
        &mut self,
        store: &S,
        column: Column,
        default: Option<Value>,
    ) -> Result<()> {
        Command::new()
            .alter_table(&self.name)
            .add_column(&column, default)
            .execute(store)
            .map_err(|err| ddl_error(&self.name, err))?;
        let mut columns = self.columns().to_vec();
        columns.push(column);
        self.serializer = Serializer::new(columns);
        Ok(())
    }

    /// Inserts one row holding every mapped field of `record`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the insert fails.
    pub fn insert<S: Store + ?Sized>(&self, store: &S, record: &R) -> Result<()> {
        let values = self.serializer.serialize(record)?;
        let names = self.serializer.column_names();
        Command::new()
            .insert(&self.name, &names)
            .values(vec![values])
            .execute(store)?;
        Ok(())
    }

    /// First record matching `query`; `LIMIT 1` is applied when the query
    /// sets no limit.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter columns, a failed query, or a row
    /// that does not decode.
    pub fn get<S: Store + ?Sized>(&self, store: &S, query: impl Into<Query>) -> Result<Option<R>> {
        let mut query = query.into();
        if query.limit.is_none() {
            query.limit = Some(1);
        }
        self.check_query(&query)?;
        let mut cursor = Command::new()
            .select(&self.name)
            .apply(&query)
            .query(store)?;
        if !cursor.advance() {
            return Ok(None);
        }
        match cursor.current() {
            Some(row) => self.serializer.deserialize(row).map(Some),
            None => Ok(None),
        }
    }

    /// Every record matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter columns, a failed query, or a row
    /// that does not decode.
    pub fn all<S: Store + ?Sized>(&self, store: &S, query: impl Into<Query>) -> Result<Vec<R>> {
        let query = query.into();
        self.check_query(&query)?;
        Command::new()
            .select(&self.name)
            .apply(&query)
            .query(store)?
            .map(|row| self.serializer.deserialize(&row))
            .collect()
    }

    /// Applies `ops` to every row matching the query's filter and returns
    /// the affected-row count. An empty op list does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownColumn`] if an op or predicate names a
    /// column the table does not map, or an error if a value does not fit
    /// its column.
    pub fn update<S: Store + ?Sized>(
        &self,
        store: &S,
        ops: Vec<UpdateOp>,
        query: impl Into<Query>,
    ) -> Result<usize> {
        if ops.is_empty() {
            return Ok(0);
        }
        let query = query.into();
        self.check_filter(&query.filter)?;
        let ops = ops
            .into_iter()
            .map(|op| {
                let column = self.lookup(&op.column)?;
                let value = encode_value(column, op.value)?;
                if op.kind == UpdateKind::Set {
                    check_assignable::<R>(column, &value)?;
                }
                Ok(UpdateOp { value, ..op })
            })
            .collect::<Result<Vec<_>>>()?;
        Command::new()
            .update(&self.name)
            .set(ops)
            .filter(&query.filter)
            .execute(store)
    }

    /// Overwrites every mapped field of the matching rows with the fields
    /// of `record`. Returns `true` if any row changed.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the update fails.
    pub fn update_value<S: Store + ?Sized>(
        &self,
        store: &S,
        record: &R,
        query: impl Into<Query>,
    ) -> Result<bool> {
        let ops = self
            .serializer
            .serialize(record)?
            .into_iter()
            .zip(self.columns())
            .map(|(value, column)| UpdateOp::set(column.name.clone(), value))
            .collect();
        Ok(self.update(store, ops, query)? > 0)
    }

    /// Updates the matching rows if any exist, otherwise inserts `record`.
    /// Returns `true` when a row was inserted.
    ///
    /// The existence probe and the write are separate statements.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe, update, or insert fails.
    pub fn upsert<S: Store + ?Sized>(
        &self,
        store: &S,
        record: &R,
        query: impl Into<Query>,
    ) -> Result<bool> {
        let query = query.into();
        if self.has(store, query.clone())? {
            self.update_value(store, record, query)?;
            Ok(false)
        } else {
            self.insert(store, record)?;
            Ok(true)
        }
    }

    /// Deletes the rows matching the query's filter and returns how many
    /// were removed. An empty filter deletes every row.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter columns or a failed delete.
    pub fn delete<S: Store + ?Sized>(&self, store: &S, query: impl Into<Query>) -> Result<usize> {
        let query = query.into();
        self.check_filter(&query.filter)?;
        Command::new()
            .delete(&self.name)
            .filter(&query.filter)
            .execute(store)
    }

    /// Returns `true` if any row matches the query's filter.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter columns or a failed probe.
    pub fn has<S: Store + ?Sized>(&self, store: &S, query: impl Into<Query>) -> Result<bool> {
        let query = query.into();
        self.check_filter(&query.filter)?;
        let row = first_row(
            Command::new()
                .exists(&self.name, &query.filter)
                .query(store)?,
        )?;
        Ok(row.int64(0)? != 0)
    }

    /// Number of rows matching the query's filter.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter columns or a failed count.
    pub fn row_count<S: Store + ?Sized>(&self, store: &S, query: impl Into<Query>) -> Result<u64> {
        let query = query.into();
        self.check_filter(&query.filter)?;
        let row = first_row(
            Command::new()
                .count(&self.name)
                .filter(&query.filter)
                .query(store)?,
        )?;
        to_u64(row.int64(0)?)
    }

    /// 1-based rank, under the query's sort, of the first row matching its
    /// filter. `None` when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown filter or sort columns or a failed
    /// query.
    pub fn row_position<S: Store + ?Sized>(
        &self,
        store: &S,
        query: impl Into<Query>,
    ) -> Result<Option<u64>> {
        let query = query.into();
        self.check_query(&query)?;
        let sort = query.sort.clone().unwrap_or_else(|| {
            Sort::new(Vec::<String>::new(), SortOperator::Plus, SortOrder::Asc)
        });
        let mut cursor = Command::new()
            .row_number(&self.name, &sort)
            .filter(&query.filter)
            .limit(1)
            .query(store)?;
        if !cursor.advance() {
            return Ok(None);
        }
        match cursor.current() {
            Some(row) => to_u64(row.int64(0)?).map(Some),
            None => Ok(None),
        }
    }

    fn lookup(&self, name: &str) -> Result<&Column> {
        self.serializer
            .column(name)
            .ok_or_else(|| DriverError::UnknownColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }

    fn check_filter(&self, filter: &Filter) -> Result<()> {
        for predicate in filter.predicates() {
            self.lookup(&predicate.column)?;
        }
        Ok(())
    }

    fn check_query(&self, query: &Query) -> Result<()> {
        self.check_filter(&query.filter)?;
        if let Some(sort) = &query.sort {
            for column in sort.columns() {
                self.lookup(column)?;
            }
        }
        Ok(())
    }
}

impl<R: Record> TableMeta for Table<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn record_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn columns(&self) -> &[Column] {
        self.serializer.columns()
    }

    fn create(&self, store: &dyn Store) -> Result<()> {
        Table::<R>::create(self, store)
    }

    fn create_column(
        &mut self,
        store: &dyn Store,
        column: Column,
        default: Option<Value>,
    ) -> Result<()> {
        Table::<R>::create_column(self, store, column, default)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn ddl_error(table: &str, err: DriverError) -> DriverError {
    match err {
        DriverError::DatabaseError(source) => DriverError::MigrationError {
            table: table.to_string(),
            source,
        },
        other => other,
    }
}

// Assigned values must decode back into the record's field type.
fn check_assignable<R: Record>(column: &Column, value: &Value) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    R::default()
        .assign(&column.name, value.clone())
        .map_err(|err| {
            DriverError::ConversionError(format!(
                "cannot set column '{}' of {}: {err}",
                column.name,
                R::TABLE
            ))
        })
}

fn first_row(mut cursor: Cursor) -> Result<Row> {
    cursor
        .next()
        .ok_or_else(|| DriverError::ConversionError("aggregate query returned no rows".into()))
}

fn to_u64(value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| DriverError::ConversionError(format!("negative aggregate result {value}")))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use sqlite_driver_core::record;

    use super::*;

    record! {
        table = "users",
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct User {
            pub id: u32 => [primary_key()],
            pub money: u32,
            pub name: String,
        }
    }

    fn setup() -> (Connection, Table<User>) {
        let conn = Connection::open_in_memory().unwrap();
        let table = Table::<User>::new(Column::from_fields(&User::fields()));
        table.create(&conn).unwrap();
        for (id, money, name) in [(1, 10, "ann"), (2, 30, "bob"), (3, 20, "cy")] {
            table
                .insert(
                    &conn,
                    &User {
                        id,
                        money,
                        name: name.into(),
                    },
                )
                .unwrap();
        }
        (conn, table)
    }

    #[test]
    fn test_get_and_all() {
        let (conn, table) = setup();
        let user = table.get(&conn, Filter::new().eq("id", 2)).unwrap().unwrap();
        assert_eq!(user.name, "bob");
        assert!(table.get(&conn, Filter::new().eq("id", 9)).unwrap().is_none());

        let sorted = table
            .all(&conn, Query::new().sort(Sort::desc("money")))
            .unwrap();
        let ids: Vec<_> = sorted.iter().map(|u| u.id).collect();
        assert_eq!(ids, [2, 3, 1]);

        let page = table
            .all(&conn, Query::new().sort(Sort::asc("id")).offset(1))
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 2);
    }

    #[test]
    fn test_update_ops() {
        let (conn, table) = setup();
        let affected = table
            .update(
                &conn,
                vec![UpdateOp::add("money", 5)],
                Filter::new().gte("money", 20),
            )
            .unwrap();
        assert_eq!(affected, 2);
        let bob = table.get(&conn, Filter::new().eq("id", 2)).unwrap().unwrap();
        assert_eq!(bob.money, 35);

        assert_eq!(table.update(&conn, Vec::new(), Query::new()).unwrap(), 0);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let (conn, table) = setup();
        let err = table
            .update(&conn, vec![UpdateOp::set("nope", 1)], Query::new())
            .unwrap_err();
        assert!(matches!(err, DriverError::UnknownColumn { .. }));
        let err = table.delete(&conn, Filter::new().eq("nope", 1)).unwrap_err();
        assert!(matches!(err, DriverError::UnknownColumn { .. }));
    }

    #[test]
    fn test_delete_has_count() {
        let (conn, table) = setup();
        assert!(table.has(&conn, Filter::new().eq("name", "cy")).unwrap());
        assert_eq!(table.row_count(&conn, Query::new()).unwrap(), 3);
        assert_eq!(table.delete(&conn, Filter::new().lt("money", 25)).unwrap(), 2);
        assert!(!table.has(&conn, Filter::new().eq("name", "cy")).unwrap());
        assert_eq!(table.row_count(&conn, Query::new()).unwrap(), 1);
    }

    #[test]
    fn test_row_position() {
        let (conn, table) = setup();
        let rank = |id: u32| {
            table
                .row_position(
                    &conn,
                    Query::new()
                        .filter(Filter::new().eq("id", id))
                        .sort(Sort::desc("money")),
                )
                .unwrap()
        };
        assert_eq!(rank(2), Some(1));
        assert_eq!(rank(3), Some(2));
        assert_eq!(rank(1), Some(3));
        assert_eq!(rank(7), None);
    }

    #[test]
    fn test_upsert() {
        let (conn, table) = setup();
        let dan = User {
            id: 4,
            money: 0,
            name: "dan".into(),
        };
        assert!(table.upsert(&conn, &dan, Filter::new().eq("id", 4)).unwrap());
        assert_eq!(table.row_count(&conn, Query::new()).unwrap(), 4);

        let rich = User { money: 99, ..dan };
        assert!(!table.upsert(&conn, &rich, Filter::new().eq("id", 4)).unwrap());
        assert_eq!(table.row_count(&conn, Query::new()).unwrap(), 4);
        let stored = table.get(&conn, Filter::new().eq("id", 4)).unwrap().unwrap();
        assert_eq!(stored.money, 99);
    }

    #[test]
    fn test_create_column_extends_serializer() {
        let conn = Connection::open_in_memory().unwrap();
        let fields = User::fields();
        let mut table = Table::<User>::new(Column::from_fields(&fields[..2]));
        table.create(&conn).unwrap();
        table
            .create_column(&conn, Column::from_field(&fields[2], 2), None)
            .unwrap();
        assert_eq!(table.serializer().column_names(), ["id", "money", "name"]);
        assert!(matches!(
            table.create(&conn).unwrap_err(),
            DriverError::MigrationError { .. }
        ));
    }
}
