//! Execution lifecycle: open, execute, hand the cursor to handlers, clean up.
//!
//! Every path follows the same order on exit, success or failure: the reader is
//! dropped, then the connection is closed if this call owns it, then the command
//! is released. Cancellation is observed while opening, while executing and
//! while advancing between result sets.

mod blocking;
mod lease;
mod nonblocking;

use std::future::Future;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::cursor::SprocResults;
use crate::error::SprocError;

/// Returned by the non-query paths when the driver reports no affected-row count.
pub const ROWS_AFFECTED_UNKNOWN: i64 = -1;

/// Asynchronous consumer of a [`SprocResults`] cursor.
///
/// Any `FnMut(&mut SprocResults) -> Result<T, SprocError>` closure is a handler
/// that completes immediately. Implement the trait directly when a handler needs
/// to await, e.g. to advance with
/// [`next_result_async`](SprocResults::next_result_async).
///
/// ```rust
/// use futures_util::future::BoxFuture;
/// use sql_sproc::prelude::*;
///
/// struct CountSets;
///
/// impl ResultHandler for CountSets {
///     type Output = usize;
///
///     fn handle<'r>(
///         &'r mut self,
///         results: &'r mut SprocResults,
///     ) -> BoxFuture<'r, Result<usize, SprocError>> {
///         Box::pin(async move {
///             let mut sets = 1;
///             while results.next_result_async(None).await? {
///                 sets += 1;
///             }
///             Ok(sets)
///         })
///     }
/// }
/// ```
pub trait ResultHandler: Send {
    type Output: Send;

    fn handle<'r>(
        &'r mut self,
        results: &'r mut SprocResults,
    ) -> BoxFuture<'r, Result<Self::Output, SprocError>>;
}

impl<F, T> ResultHandler for F
where
    F: FnMut(&mut SprocResults) -> Result<T, SprocError> + Send,
    T: Send + 'static,
{
    type Output = T;

    fn handle<'r>(
        &'r mut self,
        results: &'r mut SprocResults,
    ) -> BoxFuture<'r, Result<T, SprocError>> {
        Box::pin(std::future::ready((*self)(results)))
    }
}

/// Run `operation`, giving up with `SprocError::Cancelled` as soon as `cancel`
/// fires. An already-cancelled token wins over a ready operation.
pub(crate) async fn cancellable<T, F>(
    cancel: Option<&CancellationToken>,
    operation: F,
) -> Result<T, SprocError>
where
    F: Future<Output = Result<T, SprocError>>,
{
    let Some(token) = cancel else {
        return operation.await;
    };
    tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!("operation cancelled");
            Err(SprocError::Cancelled)
        }
        result = operation => result,
    }
}

fn rows_affected(count: Option<u64>) -> Result<i64, SprocError> {
    match count {
        None => Ok(ROWS_AFFECTED_UNKNOWN),
        Some(n) => i64::try_from(n).map_err(|e| {
            SprocError::ConversionError(format!("Invalid rows affected count: {e}"))
        }),
    }
}
