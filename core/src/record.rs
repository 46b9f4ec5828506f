//! Record types and the `record!` declaration macro.

use crate::types::FieldDef;
use crate::value::{Value, ValueError};

/// A struct mapped onto one table.
///
/// Usually implemented with [`record!`](crate::record). The field list from
/// [`fields`](Record::fields), the pairs from [`values`](Record::values),
/// and the names accepted by [`assign`](Record::assign) must agree.
pub trait Record: Default + 'static {
    /// Table name.
    const TABLE: &'static str;

    /// Declared fields in declaration order.
    fn fields() -> Vec<FieldDef>;

    /// Current field values in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be represented as a [`Value`].
    fn values(&self) -> Result<Vec<(&'static str, Value)>, ValueError>;

    /// Assigns a decoded value to the named field.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownField`] for an undeclared name, or a
    /// conversion error if the value does not fit the field type.
    fn assign(&mut self, field: &str, value: Value) -> Result<(), ValueError>;
}

/// Declares a struct and implements [`Record`] for it.
///
/// Field traits follow the type after `=>` as builder calls on
/// [`FieldDef`]: `primary_key()`, `not_null()`, `references("table", "column")`.
/// The struct must implement `Default`; decoding starts from the default
/// value and leaves NULL columns untouched.
///
/// # Examples
///
/// ```
/// use sqlite_driver_core::{Record, record};
///
/// record! {
///     table = "users",
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct User {
///         pub id: u32 => [primary_key()],
///         pub money: u32,
///         pub name: String => [not_null()],
///     }
/// }
///
/// let fields = User::fields();
/// assert_eq!(User::TABLE, "users");
/// assert_eq!(fields.len(), 3);
/// assert!(fields[0].primary_key);
/// assert!(fields[2].not_null);
///
/// let mut user = User::default();
/// user.assign("money", 50u32.into()).unwrap();
/// assert_eq!(user.money, 50);
/// ```
#[macro_export]
macro_rules! record {
    (
        table = $table:literal,
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
                $( => [ $( $trait:ident ( $( $arg:expr ),* ) ),* $(,)? ] )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            const TABLE: &'static str = $table;

            fn fields() -> ::std::vec::Vec<$crate::FieldDef> {
                ::std::vec![
                    $(
                        $crate::FieldDef::of::<$ty>(stringify!($field))
                            $( $( .$trait( $( $arg ),* ) )* )?
                    ),*
                ]
            }

            fn values(
                &self,
            ) -> ::std::result::Result<
                ::std::vec::Vec<(&'static str, $crate::Value)>,
                $crate::ValueError,
            > {
                ::std::result::Result::Ok(::std::vec![
                    $(
                        (stringify!($field), $crate::FieldType::to_value(&self.$field)?)
                    ),*
                ])
            }

            fn assign(
                &mut self,
                field: &str,
                value: $crate::Value,
            ) -> ::std::result::Result<(), $crate::ValueError> {
                match field {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::FieldType>::from_value(value)?;
                            ::std::result::Result::Ok(())
                        }
                    )*
                    other => ::std::result::Result::Err($crate::ValueError::UnknownField {
                        record: stringify!($name),
                        field: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{DataCategory, Json, Record, Value, ValueError};

    crate::record! {
        table = "items",
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct Item {
            pub id: i64 => [primary_key()],
            pub owner: u32 => [not_null(), references("users", "id")],
            pub label: Option<String>,
            pub weight: f32,
            pub tags: Vec<String>,
            pub pos: Json<(i32, i32)>,
        }
    }

    #[test]
    fn test_fields_follow_declaration() {
        let fields = Item::fields();
        let names: Vec<_> = fields.iter().map(|f| f.name).collect();
        assert_eq!(names, ["id", "owner", "label", "weight", "tags", "pos"]);
        assert!(fields[0].primary_key);
        assert!(fields[1].not_null);
        assert_eq!(fields[1].foreign_key.as_ref().unwrap().column, "id");
        assert_eq!(fields[2].category, DataCategory::Text);
        assert_eq!(fields[3].category, DataCategory::Float);
        assert_eq!(fields[4].category, DataCategory::Json);
        assert_eq!(fields[5].category, DataCategory::Json);
    }

    #[test]
    fn test_values_in_declaration_order() {
        let item = Item {
            id: 3,
            owner: 1,
            label: None,
            weight: 0.5,
            tags: vec!["a".into()],
            pos: Json((1, 2)),
        };
        let values = item.values().unwrap();
        assert_eq!(values[0], ("id", Value::Int(3)));
        assert_eq!(values[2], ("label", Value::Null));
        assert_eq!(values[4], ("tags", Value::Json(r#"["a"]"#.into())));
        assert_eq!(values[5], ("pos", Value::Json("[1,2]".into())));
    }

    #[test]
    fn test_assign_unknown_field() {
        let mut item = Item::default();
        let err = item.assign("missing", Value::Int(1)).unwrap_err();
        assert!(matches!(err, ValueError::UnknownField { record: "Item", .. }));
    }

    #[test]
    fn test_assign_converts_value() {
        let mut item = Item::default();
        item.assign("label", Value::Text("box".into())).unwrap();
        item.assign("tags", Value::Json(r#"["x","y"]"#.into())).unwrap();
        assert_eq!(item.label.as_deref(), Some("box"));
        assert_eq!(item.tags, ["x", "y"]);
    }
}
