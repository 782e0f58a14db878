//! Coercion of result-set cells into Rust values.
//!
//! The record mapper and the scalar reader both go through [`FromRowValue`].
//! Coercions are deliberately narrow: integers convert between widths with a
//! range check, integers widen into floats, `0`/`1` become booleans, text
//! parses into timestamps and JSON. Anything else is a
//! [`SprocError::ConversionError`].

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::SprocError;
use crate::types::RowValues;

/// Conversion from a non-null cell value, plus the type's null-equivalent.
pub trait FromRowValue: Sized {
    /// Convert a non-null cell.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::ConversionError` if the value cannot represent `Self`.
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError>;

    /// The value written into a field when the column is database-null.
    ///
    /// `None` means the type has no null-equivalent and the field keeps its
    /// default.
    #[must_use]
    fn null_value() -> Option<Self> {
        None
    }
}

fn mismatch(value: &RowValues, expected: &str) -> SprocError {
    SprocError::ConversionError(format!(
        "cannot convert {} value into {expected}",
        value.type_name()
    ))
}

macro_rules! impl_from_row_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRowValue for $ty {
                fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
                    let raw = match value {
                        RowValues::Int(i) => *i,
                        RowValues::Bool(b) => i64::from(*b),
                        other => return Err(mismatch(other, stringify!($ty))),
                    };
                    <$ty>::try_from(raw).map_err(|e| {
                        SprocError::ConversionError(format!(
                            "{raw} out of range for {}: {e}",
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

impl_from_row_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value.as_float().ok_or_else(|| mismatch(value, "f64"))
    }
}

impl FromRowValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value
            .as_float()
            .map(|f| f as f32)
            .ok_or_else(|| mismatch(value, "f32"))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value.as_bool().copied().ok_or_else(|| mismatch(value, "bool"))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value
            .as_text()
            .map(ToString::to_string)
            .ok_or_else(|| mismatch(value, "String"))
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value
            .as_timestamp()
            .ok_or_else(|| mismatch(value, "NaiveDateTime"))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        value
            .as_blob()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| mismatch(value, "Vec<u8>"))
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        match value {
            RowValues::JSON(json) => Ok(json.clone()),
            RowValues::Text(text) => serde_json::from_str(text).map_err(|e| {
                SprocError::ConversionError(format!("text is not valid JSON: {e}"))
            }),
            other => Err(mismatch(other, "JSON")),
        }
    }
}

impl FromRowValue for RowValues {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        Ok(value.clone())
    }

    fn null_value() -> Option<Self> {
        Some(RowValues::Null)
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Result<Self, SprocError> {
        T::from_row_value(value).map(Some)
    }

    fn null_value() -> Option<Self> {
        Some(None)
    }
}

/// Assign a cell to a field slot with null-safe semantics.
///
/// A null cell writes the field's null-equivalent when it has one and leaves the
/// current (default) value otherwise.
///
/// # Errors
///
/// Returns `SprocError::ConversionError` if a non-null cell cannot be converted.
pub fn assign_field<V: FromRowValue>(slot: &mut V, value: &RowValues) -> Result<(), SprocError> {
    if value.is_null() {
        if let Some(null) = V::null_value() {
            *slot = null;
        }
        return Ok(());
    }
    *slot = V::from_row_value(value)?;
    Ok(())
}
