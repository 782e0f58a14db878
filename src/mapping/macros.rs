/// Implement [`SprocRecord`](crate::mapping::SprocRecord) for an existing struct.
///
/// Each listed field binds to the column of the same name; `field as "Column"`
/// binds it to a differently named column. Matching is case-insensitive.
///
/// ```rust
/// use sql_sproc::impl_sproc_record;
///
/// #[derive(Debug, Default)]
/// pub struct User {
///     pub id: i64,
///     pub name: Option<String>,
///     pub signed_up: Option<chrono::NaiveDateTime>,
/// }
///
/// impl_sproc_record!(User { id, name, signed_up as "SignupDate" });
/// ```
#[macro_export]
macro_rules! impl_sproc_record {
    ($record:ty { $($field:ident $(as $column:literal)?),* $(,)? }) => {
        impl $crate::mapping::SprocRecord for $record {
            fn field_bindings() -> ::std::vec::Vec<$crate::mapping::FieldBinding<Self>> {
                ::std::vec![
                    $(
                        $crate::mapping::FieldBinding::new(
                            $crate::__sproc_column_name!($field $(, $column)?),
                            |record: &mut Self, value: &$crate::types::RowValues| {
                                $crate::conversion::assign_field(&mut record.$field, value)
                            },
                        )
                    ),*
                ]
            }
        }
    };
}

/// Declare a struct and its [`SprocRecord`](crate::mapping::SprocRecord)
/// implementation in one go.
///
/// ```rust
/// use sql_sproc::sproc_record;
///
/// sproc_record! {
///     #[derive(Debug, Default, Clone, PartialEq)]
///     pub struct OrderLine {
///         pub order_id: i64 as "OrderId",
///         pub sku: String,
///         pub quantity: i32,
///     }
/// }
/// ```
#[macro_export]
macro_rules! sproc_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty $(as $column:literal)?
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

        $crate::impl_sproc_record!($name { $($field $(as $column)?),* });
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __sproc_column_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}
