//! Row predicates for `WHERE` clauses.
//!
//! A [`Filter`] is an ordered list of [`Predicate`]s. Consecutive predicates
//! are joined with `AND` unless the later one was added after
//! [`Filter::or`]. [`Filter::not`] negates exactly the next predicate. Both
//! flags are one-shot and live only inside the filter being built.
//!
//! # Examples
//!
//! ```
//! use sqlite_driver::Filter;
//!
//! let filter = Filter::new().eq("id", 1).eq("name", "x");
//! assert_eq!(filter.render(), r#""id" = 1 AND "name" = 'x'"#);
//!
//! let filter = Filter::new().eq("id", 1).or().eq("name", "x");
//! assert_eq!(filter.render(), r#""id" = 1 OR "name" = 'x'"#);
//!
//! let filter = Filter::new().not().starts_with("name", "a").contains("name", "b");
//! assert_eq!(
//!     filter.render(),
//!     r#""name" NOT LIKE 'a%' ESCAPE '\' AND "name" LIKE '%b%' ESCAPE '\'"#
//! );
//! ```

use sqlite_driver_core::Value;

use crate::command::{ident, literal, quote};

/// How a predicate joins the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    /// `AND` (the default).
    #[default]
    And,
    /// `OR`.
    Or,
}

impl Connective {
    fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Test applied to a column.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq(Value),
    /// `column != value`
    NotEq(Value),
    /// `column LIKE 'value%'`
    StartsWith(String),
    /// `column LIKE '%value'`
    EndsWith(String),
    /// `column LIKE '%value%'`
    Contains(String),
    /// `column > value`
    Gt(Value),
    /// `column >= value`
    Gte(Value),
    /// `column < value`
    Lt(Value),
    /// `column <= value`
    Lte(Value),
    /// `column IN (values)`
    In(Vec<Value>),
}

/// A single condition on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column the condition applies to.
    pub column: String,
    /// The test itself.
    pub condition: Condition,
    /// Whether the condition is negated.
    pub negated: bool,
    /// Joiner to the previous predicate; ignored for the first one.
    pub connective: Connective,
}

impl Predicate {
    /// Creates an `AND`-joined, non-negated predicate.
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
            negated: false,
            connective: Connective::And,
        }
    }

    /// Renders the predicate without its connective.
    pub fn render(&self) -> String {
        let column = ident(&self.column);
        let column = column.as_str();
        let not = if self.negated { "NOT " } else { "" };
        match &self.condition {
            Condition::Eq(Value::Null) => format!("{column} IS {not}NULL"),
            Condition::NotEq(Value::Null) => {
                let not = if self.negated { "" } else { "NOT " };
                format!("{column} IS {not}NULL")
            }
            Condition::Eq(v) => self.comparison("=", v),
            Condition::NotEq(v) => self.comparison("!=", v),
            Condition::Gt(v) => self.comparison(">", v),
            Condition::Gte(v) => self.comparison(">=", v),
            Condition::Lt(v) => self.comparison("<", v),
            Condition::Lte(v) => self.comparison("<=", v),
            Condition::StartsWith(s) => like(column, not, &format!("{}%", escape_like(s))),
            Condition::EndsWith(s) => like(column, not, &format!("%{}", escape_like(s))),
            Condition::Contains(s) => like(column, not, &format!("%{}%", escape_like(s))),
            Condition::In(values) => {
                let list = values.iter().map(literal).collect::<Vec<_>>().join(", ");
                format!("{column} {not}IN ({list})")
            }
        }
    }

    fn comparison(&self, op: &str, value: &Value) -> String {
        let expr = format!("{} {op} {}", ident(&self.column), literal(value));
        if self.negated {
            format!("NOT ({expr})")
        } else {
            expr
        }
    }
}

fn like(column: &str, not: &str, pattern: &str) -> String {
    format!(r"{column} {not}LIKE {} ESCAPE '\'", quote(pattern))
}

/// Escapes LIKE wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Ordered predicate list with one-shot `not`/`or` flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
    negate_next: bool,
    or_next: bool,
}

impl Filter {
    /// Creates an empty filter, which matches every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Negates the next predicate only.
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negate_next = true;
        self
    }

    /// Joins the next predicate to the previous one with `OR`.
    #[must_use]
    pub fn or(mut self) -> Self {
        self.or_next = true;
        self
    }

    /// Appends a predicate, applying and clearing the pending flags.
    #[must_use]
    pub fn push(mut self, mut predicate: Predicate) -> Self {
        if std::mem::take(&mut self.negate_next) {
            predicate.negated = !predicate.negated;
        }
        if std::mem::take(&mut self.or_next) {
            predicate.connective = Connective::Or;
        }
        self.predicates.push(predicate);
        self
    }

    fn with(self, column: impl Into<String>, condition: Condition) -> Self {
        self.push(Predicate::new(column, condition))
    }

    /// `column = value` (`IS NULL` for a null value).
    #[must_use]
    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Eq(value.into()))
    }

    /// `column != value` (`IS NOT NULL` for a null value).
    #[must_use]
    pub fn ne(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::NotEq(value.into()))
    }

    /// Text starts with `prefix`.
    #[must_use]
    pub fn starts_with(self, column: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.with(column, Condition::StartsWith(prefix.into()))
    }

    /// Text ends with `suffix`.
    #[must_use]
    pub fn ends_with(self, column: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.with(column, Condition::EndsWith(suffix.into()))
    }

    /// Text contains `needle`.
    #[must_use]
    pub fn contains(self, column: impl Into<String>, needle: impl Into<String>) -> Self {
        self.with(column, Condition::Contains(needle.into()))
    }

    /// `column > value`
    #[must_use]
    pub fn gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Gt(value.into()))
    }

    /// `column >= value`
    #[must_use]
    pub fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Gte(value.into()))
    }

    /// `column < value`
    #[must_use]
    pub fn lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Lt(value.into()))
    }

    /// `column <= value`
    #[must_use]
    pub fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Lte(value.into()))
    }

    /// `column IN (values)`
    #[must_use]
    pub fn is_in<V, I>(self, column: impl Into<String>, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.with(column, Condition::In(values))
    }

    /// Predicates in order.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns `true` if the filter has no predicates.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Renders the condition text that follows `WHERE`.
    ///
    /// `AND` binds tighter than `OR`, as in SQL: `a OR b AND c` is
    /// `a OR (b AND c)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                out.push(' ');
                out.push_str(predicate.connective.keyword());
                out.push(' ');
            }
            out.push_str(&predicate.render());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_join_is_and() {
        let filter = Filter::new().eq("id", 1).eq("name", "x");
        assert_eq!(filter.render(), r#""id" = 1 AND "name" = 'x'"#);
    }

    #[test]
    fn test_or_applies_to_next_predicate_only() {
        let filter = Filter::new().eq("a", 1).or().eq("b", 2).eq("c", 3);
        assert_eq!(filter.render(), r#""a" = 1 OR "b" = 2 AND "c" = 3"#);
    }

    #[test]
    fn test_not_is_one_shot() {
        let filter = Filter::new().not().eq("a", 1).eq("b", 2);
        assert_eq!(filter.render(), r#"NOT ("a" = 1) AND "b" = 2"#);
        assert!(filter.predicates()[0].negated);
        assert!(!filter.predicates()[1].negated);
    }

    #[test]
    fn test_not_on_like_and_in() {
        let filter = Filter::new()
            .not()
            .ends_with("name", "_master")
            .not()
            .is_in("id", [1, 2, 3]);
        assert_eq!(
            filter.render(),
            r#""name" NOT LIKE '%\_master' ESCAPE '\' AND "id" NOT IN (1, 2, 3)"#
        );
    }

    #[test]
    fn test_null_equality() {
        let filter = Filter::new()
            .eq("a", Value::Null)
            .ne("b", Value::Null)
            .not()
            .eq("c", Value::Null);
        assert_eq!(
            filter.render(),
            r#""a" IS NULL AND "b" IS NOT NULL AND "c" IS NOT NULL"#
        );
    }

    #[test]
    fn test_comparisons() {
        let filter = Filter::new()
            .gt("a", 1)
            .gte("b", 2.5)
            .lt("c", -3)
            .lte("d", true)
            .ne("e", "x");
        assert_eq!(
            filter.render(),
            r#""a" > 1 AND "b" >= 2.5 AND "c" < -3 AND "d" <= 1 AND "e" != 'x'"#
        );
    }

    #[test]
    fn test_text_values_are_quoted_and_escaped() {
        let filter = Filter::new().eq("name", "O'Brien").contains("bio", "100%");
        assert_eq!(
            filter.render(),
            r#""name" = 'O''Brien' AND "bio" LIKE '%100\%%' ESCAPE '\'"#
        );
    }

    #[test]
    fn test_empty_filter() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        assert_eq!(filter.render(), "");
    }

    #[test]
    fn test_in_with_text_values() {
        let filter = Filter::new().is_in("tag", ["a", "b'c"]);
        assert_eq!(filter.render(), r#""tag" IN ('a', 'b''c')"#);
    }
}
