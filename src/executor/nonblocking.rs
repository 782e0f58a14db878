use tokio_util::sync::CancellationToken;

use super::lease::ConnectionLease;
use super::{ResultHandler, cancellable, rows_affected};
use crate::command::{ProcedureCall, StoredProcCommand};
use crate::config::ExecuteOptions;
use crate::connection::AsyncConnection;
use crate::cursor::SprocResults;
use crate::error::SprocError;
use crate::types::{CommandBehavior, ConnectionHandling};

impl<C: AsyncConnection + ?Sized> StoredProcCommand<'_, C> {
    /// Execute the procedure and await `handler` over its results.
    ///
    /// The handler is borrowed, so a handler that collects into its own fields
    /// can be inspected afterwards.
    ///
    /// Connection handling matches
    /// [`execute_stored_proc`](Self::execute_stored_proc). Dropping the returned
    /// future still closes an owned connection and releases the command.
    ///
    /// # Errors
    ///
    /// Returns `SprocError::Cancelled` if `cancel` fires while opening or
    /// executing, otherwise the first failure among opening, executing and
    /// `handler`.
    pub async fn execute_stored_proc_async<H>(
        self,
        options: ExecuteOptions,
        cancel: Option<&CancellationToken>,
        handler: &mut H,
    ) -> Result<H::Output, SprocError>
    where
        H: ResultHandler + ?Sized,
    {
        tracing::debug!(
            procedure = %self.call.text,
            params = self.call.params.len(),
            behavior = ?options.behavior,
            "executing stored procedure"
        );
        let call = &self.call;
        let mut lease = ConnectionLease::for_reader(&mut *self.connection, options.connection);
        let outcome = async {
            let mut results = open_and_execute(&mut lease, call, options.behavior, cancel).await?;
            handler.handle(&mut results).await
        }
        .await;
        lease.finish(outcome)
    }

    /// Execute the procedure and run `handlers` in order over one shared cursor.
    ///
    /// Handlers do not advance the cursor for each other; a handler that wants
    /// the next result set calls `next_result` itself. The first failing
    /// handler stops the sequence.
    ///
    /// # Errors
    ///
    /// Same as [`execute_stored_proc_async`](Self::execute_stored_proc_async).
    pub async fn execute_stored_proc_async_many(
        self,
        options: ExecuteOptions,
        cancel: Option<&CancellationToken>,
        handlers: &mut [&mut dyn ResultHandler<Output = ()>],
    ) -> Result<(), SprocError> {
        tracing::debug!(
            procedure = %self.call.text,
            handlers = handlers.len(),
            "executing stored procedure with multiple handlers"
        );
        let call = &self.call;
        let mut lease = ConnectionLease::for_reader(&mut *self.connection, options.connection);
        let outcome = async {
            let mut results = open_and_execute(&mut lease, call, options.behavior, cancel).await?;
            for (index, handler) in handlers.iter_mut().enumerate() {
                tracing::debug!(
                    handler = index,
                    result_index = results.result_index(),
                    "running result handler"
                );
                handler.handle(&mut results).await?;
            }
            Ok(())
        }
        .await;
        lease.finish(outcome)
    }

    /// Asynchronous form of
    /// [`execute_stored_non_query`](Self::execute_stored_non_query).
    ///
    /// # Errors
    ///
    /// Returns `SprocError::Cancelled` if `cancel` fires while opening or
    /// executing, otherwise the driver's error.
    pub async fn execute_stored_non_query_async(
        self,
        handling: ConnectionHandling,
        cancel: Option<&CancellationToken>,
    ) -> Result<i64, SprocError> {
        tracing::debug!(procedure = %self.call.text, "executing stored procedure as non-query");
        let call = &self.call;
        let mut lease = ConnectionLease::for_non_query(&mut *self.connection, handling);
        let outcome = async {
            lease.open_async(cancel).await?;
            cancellable(cancel, lease.connection().execute_non_query_async(call)).await
        }
        .await;
        rows_affected(lease.finish(outcome)?)
    }
}

async fn open_and_execute<C>(
    lease: &mut ConnectionLease<'_, C>,
    call: &ProcedureCall,
    behavior: CommandBehavior,
    cancel: Option<&CancellationToken>,
) -> Result<SprocResults, SprocError>
where
    C: AsyncConnection + ?Sized,
{
    lease.open_async(cancel).await?;
    let reader = cancellable(cancel, lease.connection().execute_reader_async(call)).await?;
    Ok(SprocResults::with_behavior(reader, behavior))
}
