//! Update assignments for `UPDATE … SET`.

use sqlite_driver_core::{Record, Value};

use crate::command::{ident, literal};
use crate::error::Result;

/// How an assignment combines with the current column value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// `column = value`
    Set,
    /// `column = column + value`
    Add,
    /// `column = column - value`
    Subtract,
}

/// One `SET` assignment.
///
/// # Examples
///
/// ```
/// use sqlite_driver::UpdateOp;
///
/// assert_eq!(UpdateOp::set("name", "bob").render(), r#""name" = 'bob'"#);
/// assert_eq!(UpdateOp::add("money", 5).render(), r#""money" = "money" + 5"#);
/// assert_eq!(UpdateOp::subtract("hp", 2).render(), r#""hp" = "hp" - 2"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOp {
    /// Target column.
    pub column: String,
    /// Assignment kind.
    pub kind: UpdateKind,
    /// Operand.
    pub value: Value,
}

impl UpdateOp {
    /// Creates an assignment.
    pub fn new(column: impl Into<String>, kind: UpdateKind, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            kind,
            value: value.into(),
        }
    }

    /// `column = value`
    pub fn set(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, UpdateKind::Set, value)
    }

    /// `column = column + value`
    pub fn add(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, UpdateKind::Add, value)
    }

    /// `column = column - value`
    pub fn subtract(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, UpdateKind::Subtract, value)
    }

    /// One `set` per field of `record`, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be converted to a [`Value`].
    pub fn for_record<R: Record>(record: &R) -> Result<Vec<Self>> {
        Ok(record
            .values()?
            .into_iter()
            .map(|(name, value)| Self::set(name, value))
            .collect())
    }

    /// Renders the assignment expression.
    pub fn render(&self) -> String {
        let column = ident(&self.column);
        let value = literal(&self.value);
        match self.kind {
            UpdateKind::Set => format!("{column} = {value}"),
            UpdateKind::Add => format!("{column} = {column} + {value}"),
            UpdateKind::Subtract => format!("{column} = {column} - {value}"),
        }
    }
}
