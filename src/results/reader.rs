use async_trait::async_trait;

use super::result_set::{ColumnSchema, ResultSet};
use crate::error::SprocError;
use crate::types::RowValues;

/// Forward-only reader over zero or more result sets, as produced by a driver.
///
/// The reader starts positioned on the first result set, before its first row.
/// At most one result set is current; [`ResultReader::next_result`] discards
/// it and moves on.
#[async_trait]
pub trait ResultReader: Send {
    /// Column schema of the current result set (empty once past the last set).
    fn columns(&self) -> &[ColumnSchema];

    /// Whether the current result set contains any rows at all.
    fn has_rows(&self) -> bool;

    /// Advance to the next row of the current result set.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the row cannot be fetched.
    fn read(&mut self) -> Result<bool, SprocError>;

    /// Value at `ordinal` in the current row.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::ExecutionError` when there is no current row or the
    /// ordinal is out of range.
    fn value(&self, ordinal: usize) -> Result<&RowValues, SprocError>;

    /// # Errors
    ///
    /// Same conditions as [`ResultReader::value`].
    fn is_null(&self, ordinal: usize) -> Result<bool, SprocError> {
        Ok(self.value(ordinal)?.is_null())
    }

    /// Move to the next result set, returning whether one exists.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if advancing fails.
    fn next_result(&mut self) -> Result<bool, SprocError>;

    /// Asynchronous form of [`ResultReader::next_result`]. Readers backed by
    /// buffered data can rely on the default.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if advancing fails.
    async fn next_result_async(&mut self) -> Result<bool, SprocError> {
        self.next_result()
    }
}

/// Reader over result sets that were fully materialized by the driver.
#[derive(Debug, Default)]
pub struct BufferedReader {
    sets: Vec<ResultSet>,
    set_index: usize,
    row_index: Option<usize>,
}

impl BufferedReader {
    #[must_use]
    pub fn new(sets: Vec<ResultSet>) -> Self {
        Self {
            sets,
            set_index: 0,
            row_index: None,
        }
    }

    /// Number of result sets the driver returned.
    #[must_use]
    pub fn result_count(&self) -> usize {
        self.sets.len()
    }

    fn current(&self) -> Option<&ResultSet> {
        self.sets.get(self.set_index)
    }

    fn current_row(&self) -> Option<&Vec<RowValues>> {
        let index = self.row_index?;
        self.current()?.rows().get(index)
    }
}

#[async_trait]
impl ResultReader for BufferedReader {
    fn columns(&self) -> &[ColumnSchema] {
        match self.current() {
            Some(set) => set.columns(),
            None => &[],
        }
    }

    fn has_rows(&self) -> bool {
        self.current().is_some_and(|set| set.row_count() > 0)
    }

    fn read(&mut self) -> Result<bool, SprocError> {
        let Some(row_count) = self.current().map(ResultSet::row_count) else {
            return Ok(false);
        };
        let next = self.row_index.map_or(0, |i| i + 1);
        if next < row_count {
            self.row_index = Some(next);
            Ok(true)
        } else {
            self.row_index = Some(row_count);
            Ok(false)
        }
    }

    fn value(&self, ordinal: usize) -> Result<&RowValues, SprocError> {
        let row = self.current_row().ok_or_else(|| {
            SprocError::ExecutionError("No current row; call read() first".to_string())
        })?;
        row.get(ordinal).ok_or_else(|| {
            SprocError::ExecutionError(format!("Column ordinal {ordinal} is out of range"))
        })
    }

    fn next_result(&mut self) -> Result<bool, SprocError> {
        if self.set_index < self.sets.len() {
            self.set_index += 1;
        }
        self.row_index = None;
        Ok(self.set_index < self.sets.len())
    }
}
