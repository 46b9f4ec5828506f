//! Record model for the SQLite record mapper.
//!
//! This crate defines the store-agnostic half of the mapper:
//!
//! - [`DataCategory`]: the closed set of persisted value kinds, and the
//!   SQL type each one is declared with.
//! - [`FieldDef`] / [`Column`]: a declared field and the same field bound
//!   to its physical ordinal in a table.
//! - [`Value`] / [`FieldType`]: tagged values and the conversions between
//!   them and Rust field types.
//! - [`Record`] and the [`record!`] macro: explicit per-type field lists
//!   with primary key, not-null, and foreign key traits.
//!
//! Validation ([`validate_record`]) rejects declarations whose names cannot
//! be safely rendered into command text.
//!
//! # Example
//!
//! ```
//! use sqlite_driver_core::*;
//!
//! record! {
//!     table = "users",
//!     #[derive(Debug, Default)]
//!     pub struct User {
//!         pub id: u32 => [primary_key()],
//!         pub money: u32,
//!     }
//! }
//!
//! let fields = User::fields();
//! assert_eq!(fields[0].category, DataCategory::Int);
//! assert!(validate_record(User::TABLE, &fields).is_empty());
//! ```

mod record;
mod types;
mod validate;
mod value;

pub use record::Record;
pub use types::*;
pub use validate::{ValidationError, is_identifier, validate_record};
pub use value::{FieldType, Json, Value, ValueError};
#[doc(hidden)]
pub use value::{decode_json, encode_json};
