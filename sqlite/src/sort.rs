//! Composite sort expressions.

use crate::command::ident;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Descending.
    Desc,
    /// Ascending.
    Asc,
}

/// Operator joining the columns of a composite sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOperator {
    /// `a+b`
    #[default]
    Plus,
    /// `a-b`
    Minus,
}

impl SortOperator {
    fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
        }
    }
}

/// An `ORDER BY` over one column or an arithmetic combination of several.
///
/// # Examples
///
/// ```
/// use sqlite_driver::{Sort, SortOperator};
///
/// assert_eq!(Sort::asc("money").render().unwrap(), r#"ORDER BY ("money") ASC"#);
///
/// let sort = Sort::desc_by(["kills", "deaths"], SortOperator::Minus);
/// assert_eq!(sort.render().unwrap(), r#"ORDER BY ("kills"-"deaths") DESC"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    columns: Vec<String>,
    operator: SortOperator,
    order: SortOrder,
}

impl Sort {
    /// Builds a sort over `columns` joined by `operator`.
    pub fn new<I, S>(columns: I, operator: SortOperator, order: SortOrder) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            operator,
            order,
        }
    }

    /// Ascending on a single column.
    pub fn asc(column: impl Into<String>) -> Self {
        Self::new([column.into()], SortOperator::Plus, SortOrder::Asc)
    }

    /// Descending on a single column.
    pub fn desc(column: impl Into<String>) -> Self {
        Self::new([column.into()], SortOperator::Plus, SortOrder::Desc)
    }

    /// Ascending on a composite key.
    pub fn asc_by<I, S>(columns: I, operator: SortOperator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(columns, operator, SortOrder::Asc)
    }

    /// Descending on a composite key.
    pub fn desc_by<I, S>(columns: I, operator: SortOperator) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(columns, operator, SortOrder::Desc)
    }

    /// Columns in the sort key.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sort direction.
    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Renders the `ORDER BY` clause, or `None` if there are no columns.
    pub fn render(&self) -> Option<String> {
        if self.columns.is_empty() {
            return None;
        }
        let key = self
            .columns
            .iter()
            .map(|c| ident(c))
            .collect::<Vec<_>>()
            .join(self.operator.symbol());
        let order = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        Some(format!("ORDER BY ({key}) {order}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column() {
        assert_eq!(
            Sort::desc("score").render().unwrap(),
            r#"ORDER BY ("score") DESC"#
        );
    }

    #[test]
    fn test_composite_plus() {
        let sort = Sort::asc_by(["a", "b", "c"], SortOperator::Plus);
        assert_eq!(sort.render().unwrap(), r#"ORDER BY ("a"+"b"+"c") ASC"#);
        assert_eq!(sort.order(), SortOrder::Asc);
    }

    #[test]
    fn test_empty_columns_render_nothing() {
        let sort = Sort::new(Vec::<String>::new(), SortOperator::Plus, SortOrder::Asc);
        assert!(sort.render().is_none());
    }
}
