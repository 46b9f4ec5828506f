//! Per-table conversion between records and stored rows.

use std::collections::HashMap;
use std::marker::PhantomData;

use rusqlite::types::Value as SqlValue;
use sqlite_driver_core::{Column, DataCategory, Record, Value, ValueError};

use crate::error::{DriverError, Result};
use crate::store::Row;

/// Encodes records into column-ordered values and decodes rows back.
///
/// Holds the table's resolved column list; decoding reads each column at
/// its ordinal and never by name.
#[derive(Debug, Clone)]
pub struct Serializer<R> {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Serializer<R> {
    /// Builds a serializer over `columns`.
    pub fn new(columns: Vec<Column>) -> Self {
        let by_name = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Self {
            columns,
            by_name,
            _record: PhantomData,
        }
    }

    /// Mapped columns in list order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column named `name`, if mapped.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    /// Column names in list order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Values of `record` in column order.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ContractViolation`] if a column has no field on
    /// the record, or a value error if a field cannot be encoded.
    pub fn serialize(&self, record: &R) -> Result<Vec<Value>> {
        let mut values: HashMap<&str, Value> = record.values()?.into_iter().collect();
        self.columns
            .iter()
            .map(|column| {
                let value = values
                    .remove(column.name.as_str())
                    .ok_or_else(|| missing_field::<R>(column))?;
                encode_value(column, value)
            })
            .collect()
    }

    /// Rebuilds a record from a `SELECT *` row.
    ///
    /// Starts from `R::default()`; NULL cells leave the field untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ConversionError`] if a cell does not decode
    /// under its column's category, or [`DriverError::ContractViolation`] if
    /// the record has no field for a column.
    pub fn deserialize(&self, row: &Row) -> Result<R> {
        let mut record = R::default();
        for column in &self.columns {
            if row.is_null(column.ordinal)? {
                continue;
            }
            let value = decode_cell(column, row)?;
            record
                .assign(&column.name, value)
                .map_err(|err| match err {
                    ValueError::UnknownField { .. } => missing_field::<R>(column),
                    other => DriverError::ConversionError(format!(
                        "column '{}' of {}: {other}",
                        column.name,
                        R::TABLE
                    )),
                })?;
        }
        Ok(record)
    }
}

fn missing_field<R: Record>(column: &Column) -> DriverError {
    DriverError::ContractViolation(format!(
        "column '{}' of table '{}' has no matching field on {}",
        column.name,
        R::TABLE,
        std::any::type_name::<R>()
    ))
}

fn decode_cell(column: &Column, row: &Row) -> Result<Value> {
    let ordinal = column.ordinal;
    let value = match column.category {
        DataCategory::Int => Value::Int(row.int64(ordinal)?),
        DataCategory::TinyInt => Value::Int(i64::from(row.int16(ordinal)?)),
        DataCategory::Float => Value::Float(row.float(ordinal)?),
        DataCategory::Bool => Value::Bool(row.int64(ordinal)? != 0),
        DataCategory::Text => Value::Text(row.string(ordinal)?.to_string()),
        DataCategory::Json => match row.raw(ordinal)? {
            SqlValue::Text(text) => Value::Json(text.clone()),
            _ => {
                return Err(DriverError::ConversionError(format!(
                    "column '{}' holds non-text json at ordinal {ordinal}",
                    column.name
                )));
            }
        },
    };
    Ok(value)
}

/// Coerces `value` to the category of `column`.
///
/// Integers become booleans or floats where the column asks for them,
/// booleans become integers, numbers and text headed for a `Json` column
/// become JSON text. NULL passes through. Integers outside `i16` are
/// refused by `TinyInt` columns.
///
/// # Errors
///
/// Returns [`DriverError::ConversionError`] if the value cannot take the
/// column's category.
pub fn encode_value(column: &Column, value: Value) -> Result<Value> {
    let coerced = match (column.category, value) {
        (_, Value::Null) => Value::Null,
        (DataCategory::TinyInt, Value::Int(v)) if i16::try_from(v).is_err() => {
            return Err(DriverError::ConversionError(format!(
                "value {v} does not fit TinyInt column '{}'",
                column.name
            )));
        }
        (DataCategory::Int | DataCategory::TinyInt, Value::Int(v)) => Value::Int(v),
        (DataCategory::Int | DataCategory::TinyInt, Value::Bool(b)) => Value::Int(i64::from(b)),
        (DataCategory::Float, Value::Float(v)) => Value::Float(v),
        (DataCategory::Float, Value::Int(v)) => Value::Float(v as f64),
        (DataCategory::Bool, Value::Bool(b)) => Value::Bool(b),
        (DataCategory::Bool, Value::Int(v)) => Value::Bool(v != 0),
        (DataCategory::Text, Value::Text(s)) => Value::Text(s),
        (DataCategory::Json, Value::Json(s) | Value::Text(s)) => Value::Json(s),
        (DataCategory::Json, Value::Int(v)) => Value::Json(v.to_string()),
        (DataCategory::Json, Value::Float(v)) if v.is_finite() => Value::json(&v)?,
        (category, other) => {
            return Err(DriverError::ConversionError(format!(
                "cannot store {} value in {category:?} column '{}'",
                other.kind(),
                column.name
            )));
        }
    };
    Ok(coerced)
}

#[cfg(test)]
mod tests {
    use sqlite_driver_core::{FieldDef, Json, record};

    use super::*;

    record! {
        table = "heroes",
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Hero {
            pub id: u32 => [primary_key()],
            pub level: u8,
            pub alive: bool,
            pub speed: f32,
            pub name: Option<String>,
            pub pos: Json<(i32, i32)>,
        }
    }

    fn hero() -> Hero {
        Hero {
            id: 1,
            level: 7,
            alive: true,
            speed: 1.5,
            name: Some("ann".into()),
            pos: Json((3, -4)),
        }
    }

    #[test]
    fn test_serialize_in_column_order() {
        let ser = Serializer::<Hero>::new(Column::from_fields(&Hero::fields()));
        let values = ser.serialize(&hero()).unwrap();
        assert_eq!(
            values,
            [
                Value::Int(1),
                Value::Int(7),
                Value::Bool(true),
                Value::Float(1.5),
                Value::Text("ann".into()),
                Value::Json("[3,-4]".into()),
            ]
        );
    }

    #[test]
    fn test_deserialize_by_ordinal() {
        // Physical layout: id, orphan, level, alive, speed, name, pos
        let mut columns = Vec::new();
        for (i, field) in Hero::fields().iter().enumerate() {
            let ordinal = if i == 0 { 0 } else { i + 1 };
            columns.push(Column::from_field(field, ordinal));
        }
        let ser = Serializer::<Hero>::new(columns);
        let row = Row::new(vec![
            SqlValue::Integer(1),
            SqlValue::Text("ignored".into()),
            SqlValue::Integer(7),
            SqlValue::Integer(1),
            SqlValue::Real(1.5),
            SqlValue::Text("ann".into()),
            SqlValue::Text("[3,-4]".into()),
        ]);
        assert_eq!(ser.deserialize(&row).unwrap(), hero());
    }

    #[test]
    fn test_null_cells_keep_defaults() {
        let ser = Serializer::<Hero>::new(Column::from_fields(&Hero::fields()));
        let row = Row::new(vec![
            SqlValue::Integer(2),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
        ]);
        let decoded = ser.deserialize(&row).unwrap();
        assert_eq!(decoded.id, 2);
        assert_eq!(decoded.name, None);
        assert_eq!(decoded.pos, Json((0, 0)));
    }

    #[test]
    fn test_column_without_field_is_contract_violation() {
        let mut columns = Column::from_fields(&Hero::fields());
        columns.push(Column::from_field(&FieldDef::of::<i32>("ghost"), 6));
        let ser = Serializer::<Hero>::new(columns);

        let err = ser.serialize(&hero()).unwrap_err();
        assert!(matches!(err, DriverError::ContractViolation(_)));

        let mut cells: Vec<SqlValue> = vec![SqlValue::Integer(1); 6];
        cells[4] = SqlValue::Text("a".into());
        cells[5] = SqlValue::Text("[0,0]".into());
        cells.push(SqlValue::Integer(9));
        let err = ser.deserialize(&Row::new(cells)).unwrap_err();
        assert!(matches!(err, DriverError::ContractViolation(_)));
    }

    #[test]
    fn test_decode_type_mismatch() {
        let ser = Serializer::<Hero>::new(Column::from_fields(&Hero::fields()));
        let row = Row::new(vec![
            SqlValue::Text("one".into()),
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
            SqlValue::Null,
        ]);
        assert!(matches!(
            ser.deserialize(&row).unwrap_err(),
            DriverError::ConversionError(_)
        ));
    }

    #[test]
    fn test_encode_value_coercions() {
        let columns = Column::from_fields(&Hero::fields());
        let ser = Serializer::<Hero>::new(columns);
        let alive = ser.column("alive").unwrap();
        let speed = ser.column("speed").unwrap();
        let pos = ser.column("pos").unwrap();
        let name = ser.column("name").unwrap();

        assert_eq!(encode_value(alive, Value::Int(0)).unwrap(), Value::Bool(false));
        assert_eq!(encode_value(speed, Value::Int(2)).unwrap(), Value::Float(2.0));
        assert_eq!(
            encode_value(pos, Value::Text("[1,1]".into())).unwrap(),
            Value::Json("[1,1]".into())
        );
        assert_eq!(encode_value(name, Value::Null).unwrap(), Value::Null);
        assert!(encode_value(name, Value::Int(3)).is_err());
        assert!(ser.column("missing").is_none());
        assert_eq!(ser.column_names(), ["id", "level", "alive", "speed", "name", "pos"]);
    }

    #[test]
    fn test_encode_value_range_and_json_numbers() {
        let columns = Column::from_fields(&Hero::fields());
        let ser = Serializer::<Hero>::new(columns);
        let level = ser.column("level").unwrap();
        let pos = ser.column("pos").unwrap();

        assert_eq!(encode_value(level, Value::Int(-5)).unwrap(), Value::Int(-5));
        assert!(matches!(
            encode_value(level, Value::Int(40_000)),
            Err(DriverError::ConversionError(_))
        ));
        assert_eq!(encode_value(pos, Value::Int(4)).unwrap(), Value::Json("4".into()));
        assert_eq!(
            encode_value(pos, Value::Float(2.5)).unwrap(),
            Value::Json("2.5".into())
        );
        assert!(encode_value(pos, Value::Float(f64::NAN)).is_err());
    }
}
