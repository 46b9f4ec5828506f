//! Query options shared by the read and write operations.
//!
//! A [`Query`] bundles a [`Filter`], an optional [`Sort`], and pagination.
//! Reads honor every part; updates and deletes use only the filter.
//!
//! # Example
//!
//! ```
//! use sqlite_driver::{Filter, Query, Sort};
//!
//! let query = Query::new()
//!     .filter(Filter::new().gt("money", 100))
//!     .sort(Sort::desc("money"))
//!     .limit(10)
//!     .offset(20);
//! assert_eq!(query.limit, Some(10));
//! ```

use crate::filter::Filter;
use crate::sort::Sort;

/// Filter, sort, and pagination for one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Row predicates; empty matches every row.
    pub filter: Filter,
    /// Optional ordering.
    pub sort: Option<Sort>,
    /// Maximum number of rows.
    pub limit: Option<u32>,
    /// Rows to skip.
    pub offset: Option<u32>,
}

impl Query {
    /// An unfiltered, unsorted query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Sets the row limit.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl From<Filter> for Query {
    fn from(filter: Filter) -> Self {
        Self::new().filter(filter)
    }
}
