use std::fmt;

use crate::error::SprocError;
use crate::types::RowValues;

/// Setter used by a [`FieldBinding`] to write one cell into a record.
pub type FieldSetter<T> = fn(&mut T, &RowValues) -> Result<(), SprocError>;

/// Association between a record field (by column name) and its setter.
///
/// Usually generated by [`sproc_record!`](crate::sproc_record) or
/// [`impl_sproc_record!`](crate::impl_sproc_record), but can be written by hand.
pub struct FieldBinding<T> {
    name: &'static str,
    setter: FieldSetter<T>,
}

impl<T> FieldBinding<T> {
    #[must_use]
    pub fn new(name: &'static str, setter: FieldSetter<T>) -> Self {
        Self { name, setter }
    }

    /// Column name this field binds to (matched case-insensitively).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Write `value` into the bound field of `record`.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::ConversionError` if the value does not fit the field.
    pub fn assign(&self, record: &mut T, value: &RowValues) -> Result<(), SprocError> {
        (self.setter)(record, value)
    }
}

impl<T> Clone for FieldBinding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldBinding<T> {}

impl<T> fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A record type the mapper can materialize rows into.
///
/// Records start from `Default` and only the fields with a matching column are
/// written, so fields without a column keep their default value.
///
/// ```rust
/// use sql_sproc::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Tally {
///     total: i64,
/// }
///
/// impl SprocRecord for Tally {
///     fn field_bindings() -> Vec<FieldBinding<Self>> {
///         vec![FieldBinding::new("Total", |record: &mut Self, value: &RowValues| {
///             assign_field(&mut record.total, value)
///         })]
///     }
/// }
/// ```
pub trait SprocRecord: Default {
    fn field_bindings() -> Vec<FieldBinding<Self>>;
}
