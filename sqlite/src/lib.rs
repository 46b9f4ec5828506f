//! Record mapping for SQLite.
//!
//! Declare record types with [`record!`], list them in a [`Schema`], and
//! open a [`Driver`]. Opening creates missing tables and appends missing
//! columns to existing ones; typed operations then build commands from
//! [`Filter`], [`Sort`], [`Query`], and [`UpdateOp`] values and decode rows
//! back into records.
//!
//! # Architecture
//!
//! - **`store`**: the [`Store`] boundary over `rusqlite`, forward-only
//!   [`Cursor`]s and ordinal [`Row`] access
//! - **`catalog`**: table and column introspection
//! - **`command`**: fragment lists rendered to command text
//! - **`filter`**, **`sort`**, **`update`**, **`query`**: operation inputs
//! - **`serializer`**: records to values and rows to records, by ordinal
//! - **`table`**: typed CRUD over one table
//! - **`schema`**, **`migration`**, **`driver`**: declaration, additive
//!   reconciliation, dispatch by record type
//! - **`config`**: YAML connection settings
//!
//! # Quick start
//!
//! ```
//! use sqlite_driver::{Driver, DriverConfig, Filter, Query, Schema, Sort, UpdateOp, record};
//!
//! record! {
//!     table = "users",
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct User {
//!         pub id: u32 => [primary_key()],
//!         pub money: u32,
//!     }
//! }
//!
//! let driver = Driver::from_config(&DriverConfig::default(), Schema::new().with::<User>()).unwrap();
//! driver.insert(&User { id: 1, money: 100 }).unwrap();
//! driver.insert(&User { id: 2, money: 300 }).unwrap();
//!
//! driver
//!     .update::<User>(vec![UpdateOp::add("money", 50)], Filter::new().eq("id", 1))
//!     .unwrap();
//!
//! let richest = driver
//!     .get::<User>(Query::new().sort(Sort::desc("money")))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(richest.id, 2);
//!
//! let rank = driver
//!     .row_position::<User>(Query::new().filter(Filter::new().eq("id", 1)).sort(Sort::desc("money")))
//!     .unwrap();
//! assert_eq!(rank, Some(2));
//! ```
//!
//! # Escaping
//!
//! Values are embedded in command text rather than bound. Text is quoted
//! with embedded quotes doubled, NUL characters are spliced in with
//! `char(0)`, and numbers are rendered from typed values. Infinities render
//! as out-of-range reals; NaN is stored as NULL. Identifiers are
//! double-quoted, validated when the schema is opened, and filter columns
//! are checked against the table before rendering, but [`Command::raw`] and
//! hand-built commands bypass those checks.

pub mod catalog;
mod command;
mod config;
mod driver;
mod error;
mod filter;
pub mod migration;
mod query;
mod schema;
mod serializer;
mod sort;
mod store;
mod table;
mod update;

pub use command::{Command, Fragment, ident, literal, quote};
pub use config::DriverConfig;
pub use driver::Driver;
pub use error::{DriverError, Result};
pub use filter::{Condition, Connective, Filter, Predicate};
pub use migration::{MigrationReport, TableChange};
pub use query::Query;
pub use schema::{Schema, TableDecl};
pub use serializer::{Serializer, encode_value};
pub use sort::{Sort, SortOperator, SortOrder};
pub use store::{Cursor, Row, Store};
pub use table::{Table, TableMeta};
pub use update::{UpdateKind, UpdateOp};

pub use sqlite_driver_core::{
    Column, DataCategory, FieldDef, FieldType, ForeignKey, Json, Record, ValidationError, Value,
    ValueError, is_identifier, json_field, record,
};
