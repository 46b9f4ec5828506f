//! Textual command construction.
//!
//! A [`Command`] is an ordered list of [`Fragment`]s rendered to SQL text in
//! one pass. Builders consume and return the command, so no state outlives
//! the command being built.
//!
//! # Value rendering
//!
//! Values are embedded in the text, not bound as parameters. [`literal`]
//! single-quotes text and JSON with embedded quotes doubled; integers,
//! floats, and booleans are rendered from their typed form. Identifiers are
//! double-quoted by [`ident`], so names that collide with keywords still
//! work; they are also validated at registration (see
//! [`is_identifier`](sqlite_driver_core::is_identifier)). This is escaping,
//! and remains an injection boundary for any caller that feeds raw fragments
//! into a command.
//!
//! # Examples
//!
//! ```
//! use sqlite_driver::{Command, Filter, Query, Sort};
//!
//! let query = Query::new()
//!     .filter(Filter::new().eq("id", 1))
//!     .sort(Sort::asc("money"))
//!     .limit(5);
//! let sql = Command::new().select("users").apply(&query).render();
//! assert_eq!(
//!     sql,
//!     r#"SELECT * FROM "users" WHERE "id" = 1 ORDER BY ("money") ASC LIMIT 5"#
//! );
//! ```

use sqlite_driver_core::{Column, Value};
use tracing::debug;

use crate::error::Result;
use crate::filter::Filter;
use crate::query::Query;
use crate::sort::Sort;
use crate::store::{Cursor, Store};
use crate::update::UpdateOp;

/// One piece of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// `SELECT cols FROM table`; empty columns select `*`.
    Select {
        /// Projected columns.
        columns: Vec<String>,
        /// Source table.
        table: String,
    },
    /// `SELECT COUNT(*) FROM table`
    Count {
        /// Source table.
        table: String,
    },
    /// `SELECT EXISTS (SELECT 1 FROM table WHERE …)`
    Exists {
        /// Probed table.
        table: String,
        /// Inner filter.
        filter: Filter,
    },
    /// `SELECT RowNum FROM (SELECT ROW_NUMBER() OVER (ORDER BY …) AS RowNum, * FROM table)`
    RowNumber {
        /// Ranked table.
        table: String,
        /// Ranking order.
        sort: Sort,
    },
    /// `INSERT INTO table (cols)`
    Insert {
        /// Target table.
        table: String,
        /// Column list.
        columns: Vec<String>,
    },
    /// `VALUES (…), (…)`
    Values(Vec<Vec<Value>>),
    /// `UPDATE table SET`
    Update {
        /// Target table.
        table: String,
    },
    /// Comma-joined assignments.
    Set(Vec<UpdateOp>),
    /// `DELETE FROM table`
    Delete {
        /// Target table.
        table: String,
    },
    /// `CREATE TABLE table (column definitions)`
    CreateTable {
        /// New table.
        table: String,
        /// Columns in ordinal order.
        columns: Vec<Column>,
    },
    /// `ALTER TABLE table`
    AlterTable {
        /// Altered table.
        table: String,
    },
    /// `ADD COLUMN definition [DEFAULT value]`
    AddColumn {
        /// New column.
        column: Column,
        /// Default for existing rows.
        default: Option<Value>,
    },
    /// `DROP COLUMN name`
    DropColumn(String),
    /// `DROP TABLE name`
    DropTable(String),
    /// `PRAGMA table_info(name)`
    TableInfo(String),
    /// `WHERE …`; renders nothing for an empty filter.
    Where(Filter),
    /// `ORDER BY …`; renders nothing for an empty sort.
    OrderBy(Sort),
    /// `LIMIT n`
    Limit(i64),
    /// `OFFSET n`
    Offset(u32),
    /// Text inserted as-is.
    Raw(String),
}

impl Fragment {
    fn render(&self) -> Option<String> {
        let text = match self {
            Self::Select { columns, table } => {
                if columns.is_empty() {
                    format!("SELECT * FROM {}", ident(table))
                } else {
                    format!("SELECT {} FROM {}", ident_list(columns), ident(table))
                }
            }
            Self::Count { table } => format!("SELECT COUNT(*) FROM {}", ident(table)),
            Self::Exists { table, filter } => {
                if filter.is_empty() {
                    format!("SELECT EXISTS (SELECT 1 FROM {})", ident(table))
                } else {
                    format!(
                        "SELECT EXISTS (SELECT 1 FROM {} WHERE {})",
                        ident(table),
                        filter.render()
                    )
                }
            }
            Self::RowNumber { table, sort } => {
                let order = sort.render().unwrap_or_default();
                format!(
                    "SELECT RowNum FROM (SELECT ROW_NUMBER() OVER ({order}) AS RowNum, * FROM {})",
                    ident(table)
                )
            }
            Self::Insert { table, columns } => {
                format!("INSERT INTO {} ({})", ident(table), ident_list(columns))
            }
            Self::Values(rows) => {
                let tuples = rows
                    .iter()
                    .map(|row| {
                        let cells = row.iter().map(literal).collect::<Vec<_>>();
                        format!("({})", cells.join(", "))
                    })
                    .collect::<Vec<_>>();
                format!("VALUES {}", tuples.join(", "))
            }
            Self::Update { table } => format!("UPDATE {} SET", ident(table)),
            Self::Set(ops) => ops
                .iter()
                .map(UpdateOp::render)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Delete { table } => format!("DELETE FROM {}", ident(table)),
            Self::CreateTable { table, columns } => {
                let defs = columns.iter().map(column_definition).collect::<Vec<_>>();
                format!("CREATE TABLE {} ({})", ident(table), defs.join(", "))
            }
            Self::AlterTable { table } => format!("ALTER TABLE {}", ident(table)),
            Self::AddColumn { column, default } => {
                let mut def = format!("ADD COLUMN {}", added_column_definition(column));
                if let Some(value) = default {
                    def.push_str(" DEFAULT ");
                    def.push_str(&literal(value));
                }
                def
            }
            Self::DropColumn(name) => format!("DROP COLUMN {}", ident(name)),
            Self::DropTable(name) => format!("DROP TABLE {}", ident(name)),
            Self::TableInfo(name) => format!("PRAGMA table_info({})", ident(name)),
            Self::Where(filter) => {
                if filter.is_empty() {
                    return None;
                }
                format!("WHERE {}", filter.render())
            }
            Self::OrderBy(sort) => return sort.render(),
            Self::Limit(n) => format!("LIMIT {n}"),
            Self::Offset(n) => format!("OFFSET {n}"),
            Self::Raw(text) => text.clone(),
        };
        Some(text)
    }
}

/// `"name" TYPE [PRIMARY KEY] [NOT NULL] [REFERENCES "t"("c")]`
fn column_definition(column: &Column) -> String {
    let mut def = format!("{} {}", ident(&column.name), column.category.sql_type());
    if column.primary_key {
        def.push_str(" PRIMARY KEY");
    }
    if column.not_null {
        def.push_str(" NOT NULL");
    }
    if let Some(fk) = &column.foreign_key {
        def.push_str(&format!(
            " REFERENCES {}({})",
            ident(&fk.table),
            ident(&fk.column)
        ));
    }
    def
}

// SQLite cannot add a PRIMARY KEY column to an existing table.
fn added_column_definition(column: &Column) -> String {
    let mut column = column.clone();
    column.primary_key = false;
    column_definition(&column)
}

/// Renders a value as an SQL literal.
///
/// # Examples
///
/// ```
/// use sqlite_driver::literal;
/// use sqlite_driver::Value;
///
/// assert_eq!(literal(&Value::Text("it's".into())), "'it''s'");
/// assert_eq!(literal(&Value::Bool(true)), "1");
/// assert_eq!(literal(&Value::Float(f64::NAN)), "NULL");
/// assert_eq!(literal(&Value::Float(f64::INFINITY)), "9e999");
/// ```
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(v) => v.to_string(),
        // SQLite reads out-of-range reals as infinities; NaN has no literal.
        Value::Float(v) if v.is_nan() => "NULL".to_string(),
        Value::Float(v) if *v == f64::INFINITY => "9e999".to_string(),
        Value::Float(v) if *v == f64::NEG_INFINITY => "-9e999".to_string(),
        Value::Float(v) => format!("{v:?}"),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Text(v) | Value::Json(v) => quote(v),
    }
}

/// Single-quotes text, doubling embedded quotes.
///
/// NUL characters end a statement early in SQLite, so each one is spliced
/// in as `char(0)`.
///
/// # Examples
///
/// ```
/// use sqlite_driver::quote;
///
/// assert_eq!(quote("it's"), "'it''s'");
/// assert_eq!(quote("a\0b"), "('a' || char(0) || 'b')");
/// ```
pub fn quote(text: &str) -> String {
    if !text.contains('\0') {
        return format!("'{}'", text.replace('\'', "''"));
    }
    let parts = text
        .split('\0')
        .map(|part| format!("'{}'", part.replace('\'', "''")))
        .collect::<Vec<_>>();
    format!("({})", parts.join(" || char(0) || "))
}

/// Double-quotes an identifier, doubling embedded quotes.
///
/// ```
/// use sqlite_driver::ident;
///
/// assert_eq!(ident("group"), "\"group\"");
/// ```
pub fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn ident_list(names: &[String]) -> String {
    names.iter().map(|n| ident(n)).collect::<Vec<_>>().join(", ")
}

/// An ordered list of fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Command {
    fragments: Vec<Fragment>,
}

impl Command {
    /// Creates an empty command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment.
    #[must_use]
    pub fn push(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    /// `SELECT * FROM table`
    #[must_use]
    pub fn select(self, table: &str) -> Self {
        self.push(Fragment::Select {
            columns: Vec::new(),
            table: table.to_string(),
        })
    }

    /// `SELECT columns FROM table`
    #[must_use]
    pub fn select_columns(self, columns: &[&str], table: &str) -> Self {
        self.push(Fragment::Select {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            table: table.to_string(),
        })
    }

    /// `SELECT COUNT(*) FROM table`
    #[must_use]
    pub fn count(self, table: &str) -> Self {
        self.push(Fragment::Count {
            table: table.to_string(),
        })
    }

    /// Existence probe for rows matching `filter`.
    #[must_use]
    pub fn exists(self, table: &str, filter: &Filter) -> Self {
        self.push(Fragment::Exists {
            table: table.to_string(),
            filter: filter.clone(),
        })
    }

    /// 1-based rank of every row under `sort`; follow with a filter to pick
    /// rows out of the ranking.
    #[must_use]
    pub fn row_number(self, table: &str, sort: &Sort) -> Self {
        self.push(Fragment::RowNumber {
            table: table.to_string(),
            sort: sort.clone(),
        })
    }

    /// `INSERT INTO table (columns)`
    #[must_use]
    pub fn insert(self, table: &str, columns: &[&str]) -> Self {
        self.push(Fragment::Insert {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// `VALUES (…), (…)`
    #[must_use]
    pub fn values(self, rows: Vec<Vec<Value>>) -> Self {
        self.push(Fragment::Values(rows))
    }

    /// `UPDATE table SET`
    #[must_use]
    pub fn update(self, table: &str) -> Self {
        self.push(Fragment::Update {
            table: table.to_string(),
        })
    }

    /// Comma-joined assignments.
    #[must_use]
    pub fn set(self, ops: Vec<UpdateOp>) -> Self {
        self.push(Fragment::Set(ops))
    }

    /// `DELETE FROM table`
    #[must_use]
    pub fn delete(self, table: &str) -> Self {
        self.push(Fragment::Delete {
            table: table.to_string(),
        })
    }

    /// `CREATE TABLE table (…)`
    #[must_use]
    pub fn create_table(self, table: &str, columns: &[Column]) -> Self {
        self.push(Fragment::CreateTable {
            table: table.to_string(),
            columns: columns.to_vec(),
        })
    }

    /// `ALTER TABLE table`
    #[must_use]
    pub fn alter_table(self, table: &str) -> Self {
        self.push(Fragment::AlterTable {
            table: table.to_string(),
        })
    }

    /// `ADD COLUMN …`
    #[must_use]
    pub fn add_column(self, column: &Column, default: Option<Value>) -> Self {
        self.push(Fragment::AddColumn {
            column: column.clone(),
            default,
        })
    }

    /// `DROP COLUMN name`
    #[must_use]
    pub fn drop_column(self, name: &str) -> Self {
        self.push(Fragment::DropColumn(name.to_string()))
    }

    /// `DROP TABLE name`
    #[must_use]
    pub fn drop_table(self, name: &str) -> Self {
        self.push(Fragment::DropTable(name.to_string()))
    }

    /// `PRAGMA table_info(name)`
    #[must_use]
    pub fn table_info(self, name: &str) -> Self {
        self.push(Fragment::TableInfo(name.to_string()))
    }

    /// `WHERE …`
    #[must_use]
    pub fn filter(self, filter: &Filter) -> Self {
        self.push(Fragment::Where(filter.clone()))
    }

    /// `ORDER BY …`
    #[must_use]
    pub fn order_by(self, sort: &Sort) -> Self {
        self.push(Fragment::OrderBy(sort.clone()))
    }

    /// `LIMIT n`
    #[must_use]
    pub fn limit(self, limit: u32) -> Self {
        self.push(Fragment::Limit(i64::from(limit)))
    }

    /// `OFFSET n`; emits `LIMIT -1` first when no limit precedes it.
    #[must_use]
    pub fn offset(self, offset: u32) -> Self {
        let limited = self
            .fragments
            .iter()
            .any(|f| matches!(f, Fragment::Limit(_)));
        let command = if limited {
            self
        } else {
            self.push(Fragment::Limit(-1))
        };
        command.push(Fragment::Offset(offset))
    }

    /// Text inserted as-is.
    #[must_use]
    pub fn raw(self, text: &str) -> Self {
        self.push(Fragment::Raw(text.to_string()))
    }

    /// Appends the filter, sort, limit, and offset of `query`.
    #[must_use]
    pub fn apply(self, query: &Query) -> Self {
        let mut command = self.filter(&query.filter);
        if let Some(sort) = &query.sort {
            command = command.order_by(sort);
        }
        if let Some(limit) = query.limit {
            command = command.limit(limit);
        }
        if let Some(offset) = query.offset {
            command = command.offset(offset);
        }
        command
    }

    /// Fragments in order.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Renders the command text.
    pub fn render(&self) -> String {
        self.fragments
            .iter()
            .filter_map(Fragment::render)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command and returns its rows.
    ///
    /// # Errors
    ///
    /// Returns the store's error if execution fails.
    pub fn query<S: Store + ?Sized>(&self, store: &S) -> Result<Cursor> {
        let sql = self.render();
        debug!(sql = %sql, "Executing query");
        store.query(&sql)
    }

    /// Runs the command and returns the affected-row count.
    ///
    /// # Errors
    ///
    /// Returns the store's error if execution fails.
    pub fn execute<S: Store + ?Sized>(&self, store: &S) -> Result<usize> {
        let sql = self.render();
        debug!(sql = %sql, "Executing statement");
        store.execute(&sql)
    }
}
