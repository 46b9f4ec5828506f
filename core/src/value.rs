//! Tagged values and field type conversions.
//!
//! [`Value`] is the closed set of shapes a field can take on its way to and
//! from the store. [`FieldType`] ties a Rust type to its [`DataCategory`]
//! and converts between the two.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::DataCategory;

/// A single persisted value.
///
/// Narrow integers and booleans share the integer storage class but keep
/// their own variants so the renderer knows how to print them. `Json` holds
/// already-encoded JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Any integer width.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Boolean, stored as `0`/`1`.
    Bool(bool),
    /// Text.
    Text(String),
    /// Encoded JSON text.
    Json(String),
}

impl Value {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Encodes any serializable value as a [`Value::Json`].
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::Json`] if serialization fails.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ValueError> {
        encode_json(value)
    }
}

/// Errors raised while converting between field types and [`Value`]s.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The value's variant cannot become the requested type.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        /// Requested shape.
        expected: &'static str,
        /// Variant actually supplied.
        found: &'static str,
    },
    /// An integer does not fit the target width.
    #[error("value {value} is out of range for {target}")]
    OutOfRange {
        /// Offending value.
        value: String,
        /// Target type name.
        target: &'static str,
    },
    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A record was asked to assign a field it does not declare.
    #[error("record {record} has no field named {field}")]
    UnknownField {
        /// Record type name.
        record: &'static str,
        /// Requested field.
        field: String,
    },
}

impl ValueError {
    fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.kind(),
        }
    }
}

/// A Rust type that can be stored in a column.
///
/// Implemented for the scalar types, `Option<T>`, common collections, and
/// [`Json`]. Other types opt in to the `Json` category with
/// [`json_field!`](crate::json_field).
pub trait FieldType: Sized {
    /// Persisted category for this type.
    const CATEGORY: DataCategory;

    /// Converts the field into a [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented (for example an
    /// unsigned integer above `i64::MAX`).
    fn to_value(&self) -> Result<Value, ValueError>;

    /// Rebuilds the field from a decoded [`Value`].
    ///
    /// # Errors
    ///
    /// Returns an error if the variant does not match or is out of range.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! int_field {
    ($category:ident => $($ty:ty),+) => {
        $(
            impl FieldType for $ty {
                const CATEGORY: DataCategory = DataCategory::$category;

                fn to_value(&self) -> Result<Value, ValueError> {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .map_err(|_| ValueError::OutOfRange {
                            value: self.to_string(),
                            target: "i64",
                        })
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let raw = match value {
                        Value::Int(v) => v,
                        Value::Bool(b) => i64::from(b),
                        other => return Err(ValueError::mismatch("integer", &other)),
                    };
                    <$ty>::try_from(raw).map_err(|_| ValueError::OutOfRange {
                        value: raw.to_string(),
                        target: stringify!($ty),
                    })
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(value as i64)
                }
            }
        )+
    };
}

int_field!(Int => i32, i64, u16, u32);
int_field!(TinyInt => i8, u8, i16);

// 64-bit unsigned and pointer-sized integers have no lossless `From` into
// `Value`; they convert through `FieldType::to_value` only.
macro_rules! wide_int_field {
    ($($ty:ty),+) => {
        $(
            impl FieldType for $ty {
                const CATEGORY: DataCategory = DataCategory::Int;

                fn to_value(&self) -> Result<Value, ValueError> {
                    i64::try_from(*self)
                        .map(Value::Int)
                        .map_err(|_| ValueError::OutOfRange {
                            value: self.to_string(),
                            target: "i64",
                        })
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    let raw = match value {
                        Value::Int(v) => v,
                        Value::Bool(b) => i64::from(b),
                        other => return Err(ValueError::mismatch("integer", &other)),
                    };
                    <$ty>::try_from(raw).map_err(|_| ValueError::OutOfRange {
                        value: raw.to_string(),
                        target: stringify!($ty),
                    })
                }
            }
        )+
    };
}

wide_int_field!(u64, usize, isize);

// Only single precision has a native category; doubles are stored as JSON
// numbers.
impl FieldType for f64 {
    const CATEGORY: DataCategory = DataCategory::Json;

    fn to_value(&self) -> Result<Value, ValueError> {
        if !self.is_finite() {
            return Err(ValueError::OutOfRange {
                value: self.to_string(),
                target: "json number",
            });
        }
        encode_json(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Json(_) => decode_json(value),
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(ValueError::mismatch("float", &other)),
        }
    }
}

impl FieldType for f32 {
    const CATEGORY: DataCategory = DataCategory::Float;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Float(f64::from(*self)))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v as f32),
            Value::Int(v) => Ok(v as f32),
            other => Err(ValueError::mismatch("float", &other)),
        }
    }
}

impl FieldType for bool {
    const CATEGORY: DataCategory = DataCategory::Bool;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            Value::Int(v) => Ok(v != 0),
            other => Err(ValueError::mismatch("bool", &other)),
        }
    }
}

impl FieldType for String {
    const CATEGORY: DataCategory = DataCategory::Text;

    fn to_value(&self) -> Result<Value, ValueError> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) | Value::Json(v) => Ok(v),
            other => Err(ValueError::mismatch("text", &other)),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const CATEGORY: DataCategory = T::CATEGORY;

    fn to_value(&self) -> Result<Value, ValueError> {
        match self {
            Some(inner) => inner.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Wrapper that stores any serde type in a `Json` column.
///
/// # Examples
///
/// ```
/// use sqlite_driver_core::{DataCategory, FieldType, Json, Value};
///
/// let point = Json((3, 4));
/// assert_eq!(<Json<(i32, i32)>>::CATEGORY, DataCategory::Json);
/// assert_eq!(point.to_value().unwrap(), Value::Json("[3,4]".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize + DeserializeOwned> FieldType for Json<T> {
    const CATEGORY: DataCategory = DataCategory::Json;

    fn to_value(&self) -> Result<Value, ValueError> {
        encode_json(&self.0)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value).map(Json)
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for Vec<T> {
    const CATEGORY: DataCategory = DataCategory::Json;

    fn to_value(&self) -> Result<Value, ValueError> {
        encode_json(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value)
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for HashMap<String, T> {
    const CATEGORY: DataCategory = DataCategory::Json;

    fn to_value(&self) -> Result<Value, ValueError> {
        encode_json(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value)
    }
}

impl<T: Serialize + DeserializeOwned> FieldType for BTreeMap<String, T> {
    const CATEGORY: DataCategory = DataCategory::Json;

    fn to_value(&self) -> Result<Value, ValueError> {
        encode_json(self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        decode_json(value)
    }
}

crate::json_field!(serde_json::Value);

/// Stores a user type in a `Json` column.
///
/// The type must implement `serde::Serialize` and `serde::Deserialize`.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use sqlite_driver_core::{DataCategory, json_field};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Inventory {
///     slots: Vec<u32>,
/// }
///
/// json_field!(Inventory);
///
/// assert_eq!(DataCategory::of::<Inventory>(), DataCategory::Json);
/// ```
#[macro_export]
macro_rules! json_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::FieldType for $ty {
                const CATEGORY: $crate::DataCategory = $crate::DataCategory::Json;

                fn to_value(&self) -> ::std::result::Result<$crate::Value, $crate::ValueError> {
                    $crate::encode_json(self)
                }

                fn from_value(
                    value: $crate::Value,
                ) -> ::std::result::Result<Self, $crate::ValueError> {
                    $crate::decode_json(value)
                }
            }
        )+
    };
}

#[doc(hidden)]
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Value, ValueError> {
    Ok(Value::Json(serde_json::to_string(value)?))
}

#[doc(hidden)]
pub fn decode_json<T: DeserializeOwned>(value: Value) -> Result<T, ValueError> {
    match value {
        Value::Json(text) | Value::Text(text) => Ok(serde_json::from_str(&text)?),
        other => Err(ValueError::mismatch("json", &other)),
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
