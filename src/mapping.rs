//! Conversion of the current result set into typed records or a single scalar.
//!
//! Both operations work on whatever result set the reader is positioned on and
//! consume its rows: mapping the same set twice yields nothing the second time.

mod columns;
mod macros;
mod record;

pub use columns::{BoundField, ColumnBinding};
pub use record::{FieldBinding, FieldSetter, SprocRecord};

use crate::conversion::FromRowValue;
use crate::error::SprocError;
use crate::results::ResultReader;

/// Materialize every remaining row of the current result set into `T`.
///
/// Returns an empty vector, without reading, when the result set has no rows.
/// Columns without a matching field are ignored and fields without a matching
/// column keep their default.
///
/// # Errors
///
/// Returns the reader's error if fetching a row fails, or
/// `SprocError::ConversionError` if a cell does not fit its field.
pub fn map_to_list<T, R>(reader: &mut R) -> Result<Vec<T>, SprocError>
where
    T: SprocRecord,
    R: ResultReader + ?Sized,
{
    let fields = T::field_bindings();
    let binding = ColumnBinding::build(reader.columns(), &fields);

    if !reader.has_rows() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    while reader.read()? {
        let mut record = T::default();
        for bound in binding.iter() {
            let field = &fields[bound.field];
            let value = reader.value(bound.ordinal)?;
            field.assign(&mut record, value).map_err(|e| match e {
                SprocError::ConversionError(msg) => {
                    SprocError::ConversionError(format!("column `{}`: {msg}", field.name()))
                }
                other => other,
            })?;
        }
        records.push(record);
    }

    tracing::trace!(
        rows = records.len(),
        bound_fields = binding.len(),
        "mapped result set"
    );
    Ok(records)
}

/// Read the first column of the next row of the current result set.
///
/// Performs at most one read. Returns `None` when the result set has no rows,
/// when no row could be read, or when the value is database-null.
///
/// # Errors
///
/// Returns the reader's error if fetching the row fails, or
/// `SprocError::ConversionError` if the value does not fit `T`.
pub fn map_to_value<T, R>(reader: &mut R) -> Result<Option<T>, SprocError>
where
    T: FromRowValue,
    R: ResultReader + ?Sized,
{
    if !reader.has_rows() || !reader.read()? || reader.is_null(0)? {
        return Ok(None);
    }
    T::from_row_value(reader.value(0)?).map(Some)
}
