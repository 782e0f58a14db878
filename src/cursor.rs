//! The result cursor handed to result handlers.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::conversion::FromRowValue;
use crate::error::SprocError;
use crate::mapping::{self, SprocRecord};
use crate::results::{ColumnSchema, ResultReader};
use crate::types::{CommandBehavior, RowValues};

/// Forward-only cursor over the result sets of one stored-procedure execution.
///
/// Exactly one result set is current at a time. Handlers read it with
/// [`read_to_list`](Self::read_to_list) or [`read_to_value`](Self::read_to_value)
/// and move on with [`next_result`](Self::next_result). When several handlers
/// share a cursor, each one starts where the previous one stopped.
pub struct SprocResults {
    reader: Box<dyn ResultReader>,
    result_index: usize,
}

impl SprocResults {
    /// Wrap a driver reader with default behavior.
    #[must_use]
    pub fn new(reader: Box<dyn ResultReader>) -> Self {
        Self::with_behavior(reader, CommandBehavior::Default)
    }

    /// Wrap a driver reader, enforcing `behavior` on top of it.
    #[must_use]
    pub fn with_behavior(reader: Box<dyn ResultReader>, behavior: CommandBehavior) -> Self {
        let reader: Box<dyn ResultReader> = match behavior {
            CommandBehavior::Default => reader,
            restricted => Box::new(RestrictedReader::new(reader, restricted)),
        };
        Self {
            reader,
            result_index: 0,
        }
    }

    /// Map the remaining rows of the current result set into `T`.
    ///
    /// # Errors
    ///
    /// See [`mapping::map_to_list`].
    pub fn read_to_list<T: SprocRecord>(&mut self) -> Result<Vec<T>, SprocError> {
        mapping::map_to_list(self.reader.as_mut())
    }

    /// Read the first column of the next row of the current result set.
    ///
    /// # Errors
    ///
    /// See [`mapping::map_to_value`].
    pub fn read_to_value<T: FromRowValue>(&mut self) -> Result<Option<T>, SprocError> {
        mapping::map_to_value(self.reader.as_mut())
    }

    /// Advance to the next result set, returning whether one exists.
    ///
    /// # Errors
    ///
    /// Returns the driver's error unchanged.
    pub fn next_result(&mut self) -> Result<bool, SprocError> {
        let advanced = self.reader.next_result()?;
        self.record_advance(advanced);
        Ok(advanced)
    }

    /// Asynchronous form of [`next_result`](Self::next_result).
    ///
    /// # Errors
    ///
    /// Returns `SprocError::Cancelled` if `cancel` fires first, otherwise the
    /// driver's error unchanged.
    pub async fn next_result_async(
        &mut self,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, SprocError> {
        let advanced =
            crate::executor::cancellable(cancel, self.reader.next_result_async()).await?;
        self.record_advance(advanced);
        Ok(advanced)
    }

    /// Zero-based position of the current result set.
    #[must_use]
    pub fn result_index(&self) -> usize {
        self.result_index
    }

    /// Column schema of the current result set.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSchema] {
        self.reader.columns()
    }

    fn record_advance(&mut self, advanced: bool) {
        if advanced {
            self.result_index += 1;
        }
        tracing::trace!(result_index = self.result_index, advanced, "advanced result cursor");
    }
}

impl std::fmt::Debug for SprocResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SprocResults")
            .field("result_index", &self.result_index)
            .finish_non_exhaustive()
    }
}

/// Reader adapter for `SingleResult` / `SingleRow` behavior.
struct RestrictedReader {
    inner: Box<dyn ResultReader>,
    behavior: CommandBehavior,
    rows_read: usize,
    exhausted: bool,
}

impl RestrictedReader {
    fn new(inner: Box<dyn ResultReader>, behavior: CommandBehavior) -> Self {
        Self {
            inner,
            behavior,
            rows_read: 0,
            exhausted: false,
        }
    }

    fn close_out(&mut self) -> bool {
        self.exhausted = true;
        false
    }
}

#[async_trait]
impl ResultReader for RestrictedReader {
    fn columns(&self) -> &[ColumnSchema] {
        if self.exhausted {
            &[]
        } else {
            self.inner.columns()
        }
    }

    fn has_rows(&self) -> bool {
        !self.exhausted && self.inner.has_rows()
    }

    fn read(&mut self) -> Result<bool, SprocError> {
        if self.exhausted {
            return Ok(false);
        }
        if self.behavior == CommandBehavior::SingleRow && self.rows_read >= 1 {
            return Ok(false);
        }
        let has_row = self.inner.read()?;
        if has_row {
            self.rows_read += 1;
        }
        Ok(has_row)
    }

    fn value(&self, ordinal: usize) -> Result<&RowValues, SprocError> {
        if self.exhausted {
            return Err(SprocError::ExecutionError(
                "No current row; the reader is past its last result set".to_string(),
            ));
        }
        self.inner.value(ordinal)
    }

    fn next_result(&mut self) -> Result<bool, SprocError> {
        Ok(self.close_out())
    }

    async fn next_result_async(&mut self) -> Result<bool, SprocError> {
        Ok(self.close_out())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{BufferedReader, ResultSet};

    fn reader() -> Box<dyn ResultReader> {
        Box::new(BufferedReader::new(vec![
            ResultSet::with_column_names(["n"])
                .row(vec![RowValues::Int(1)])
                .row(vec![RowValues::Int(2)]),
            ResultSet::with_column_names(["m"]).row(vec![RowValues::Int(3)]),
        ]))
    }

    #[test]
    fn tracks_result_index() {
        let mut results = SprocResults::new(reader());
        assert_eq!(results.result_index(), 0);
        assert!(results.next_result().unwrap());
        assert_eq!(results.result_index(), 1);
        assert_eq!(results.read_to_value::<i64>().unwrap(), Some(3));
        assert!(!results.next_result().unwrap());
        assert_eq!(results.result_index(), 1);
    }

    #[test]
    fn single_result_hides_later_sets() {
        let mut results = SprocResults::with_behavior(reader(), CommandBehavior::SingleResult);
        assert_eq!(results.read_to_value::<i64>().unwrap(), Some(1));
        assert_eq!(results.read_to_value::<i64>().unwrap(), Some(2));
        assert!(!results.next_result().unwrap());
        assert!(results.columns().is_empty());
    }

    #[test]
    fn single_row_stops_after_first_row() {
        let mut results = SprocResults::with_behavior(reader(), CommandBehavior::SingleRow);
        assert_eq!(results.read_to_value::<i64>().unwrap(), Some(1));
        assert_eq!(results.read_to_value::<i64>().unwrap(), None);
    }

    #[tokio::test]
    async fn async_advance_observes_cancellation() {
        let mut results = SprocResults::new(reader());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = results.next_result_async(Some(&cancel)).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(results.result_index(), 0);
        assert!(results.next_result_async(None).await.unwrap());
    }
}
