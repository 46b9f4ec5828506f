//! Store boundary: run command text, read rows back by ordinal.
//!
//! The driver never talks to `rusqlite` directly outside this module and
//! [`catalog`](crate::catalog). A [`Store`] accepts rendered command text and
//! either returns a forward-only [`Cursor`] or an affected-row count.

use std::vec::IntoIter;

use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;

use crate::error::{DriverError, Result};

/// Executes rendered command text.
pub trait Store {
    /// Runs a row-returning command.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DatabaseError`] if the command fails.
    fn query(&self, sql: &str) -> Result<Cursor>;

    /// Runs a command that returns no rows and reports affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DatabaseError`] if the command fails.
    fn execute(&self, sql: &str) -> Result<usize>;
}

impl Store for Connection {
    fn query(&self, sql: &str) -> Result<Cursor> {
        let mut stmt = self.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            collected.push(Row { values });
        }
        Ok(Cursor::new(collected))
    }

    fn execute(&self, sql: &str) -> Result<usize> {
        Ok(Connection::execute(self, sql, [])?)
    }
}

/// Forward-only, read-once sequence of result rows.
///
/// Call [`advance`](Cursor::advance) before reading the first row, or
/// consume the cursor as an iterator.
#[derive(Debug)]
pub struct Cursor {
    rows: IntoIter<Row>,
    current: Option<Row>,
}

impl Cursor {
    /// Wraps already-fetched rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
            current: None,
        }
    }

    /// Moves to the next row; returns `false` once the rows are exhausted.
    pub fn advance(&mut self) -> bool {
        self.current = self.rows.next();
        self.current.is_some()
    }

    /// Row under the cursor, if [`advance`](Cursor::advance) succeeded.
    pub fn current(&self) -> Option<&Row> {
        self.current.as_ref()
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.current = None;
        self.rows.next()
    }
}

/// One result row, addressed by column ordinal.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Builds a row from raw cells.
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw cell at `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConversionError`] if `ordinal` is past the end
    /// of the row.
    pub fn raw(&self, ordinal: usize) -> Result<&SqlValue> {
        self.values.get(ordinal).ok_or_else(|| {
            DriverError::ConversionError(format!(
                "column ordinal {ordinal} out of bounds for row of width {}",
                self.values.len()
            ))
        })
    }

    /// Returns `true` if the cell at `ordinal` is NULL.
    ///
    /// # Errors
    ///
    /// Returns an error if `ordinal` is out of bounds.
    pub fn is_null(&self, ordinal: usize) -> Result<bool> {
        Ok(matches!(self.raw(ordinal)?, SqlValue::Null))
    }

    /// Integer cell at `ordinal`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConversionError`] if the cell is not an integer.
    pub fn int64(&self, ordinal: usize) -> Result<i64> {
        match self.raw(ordinal)? {
            SqlValue::Integer(v) => Ok(*v),
            other => Err(mismatch(ordinal, "integer", other)),
        }
    }

    /// Integer cell narrowed to `i32`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not an integer or does not fit.
    pub fn int32(&self, ordinal: usize) -> Result<i32> {
        let v = self.int64(ordinal)?;
        i32::try_from(v).map_err(|_| {
            DriverError::ConversionError(format!("value {v} at ordinal {ordinal} overflows i32"))
        })
    }

    /// Integer cell narrowed to `i16`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not an integer or does not fit.
    pub fn int16(&self, ordinal: usize) -> Result<i16> {
        let v = self.int64(ordinal)?;
        i16::try_from(v).map_err(|_| {
            DriverError::ConversionError(format!("value {v} at ordinal {ordinal} overflows i16"))
        })
    }

    /// Floating point cell; integer cells are widened.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConversionError`] for text, blob, or NULL cells.
    pub fn float(&self, ordinal: usize) -> Result<f64> {
        match self.raw(ordinal)? {
            SqlValue::Real(v) => Ok(*v),
            SqlValue::Integer(v) => Ok(*v as f64),
            other => Err(mismatch(ordinal, "real", other)),
        }
    }

    /// Text cell.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConversionError`] if the cell is not text.
    pub fn string(&self, ordinal: usize) -> Result<&str> {
        match self.raw(ordinal)? {
            SqlValue::Text(v) => Ok(v),
            other => Err(mismatch(ordinal, "text", other)),
        }
    }
}

fn mismatch(ordinal: usize, expected: &str, found: &SqlValue) -> DriverError {
    let found = match found {
        SqlValue::Null => "null",
        SqlValue::Integer(_) => "integer",
        SqlValue::Real(_) => "real",
        SqlValue::Text(_) => "text",
        SqlValue::Blob(_) => "blob",
    };
    DriverError::ConversionError(format!(
        "expected {expected} at ordinal {ordinal}, found {found}"
    ))
}
