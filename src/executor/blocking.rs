use super::lease::ConnectionLease;
use super::rows_affected;
use crate::command::{ProcedureCall, StoredProcCommand};
use crate::config::ExecuteOptions;
use crate::connection::SyncConnection;
use crate::cursor::SprocResults;
use crate::error::SprocError;
use crate::types::{CommandBehavior, ConnectionHandling};

impl<C: SyncConnection + ?Sized> StoredProcCommand<'_, C> {
    /// Execute the procedure and hand its results to `handler`.
    ///
    /// With [`ConnectionHandling::Managed`] a closed connection is opened for
    /// the call and closed afterwards. A connection that is already open is
    /// left as found.
    ///
    /// # Errors
    ///
    /// Returns the first failure among opening, executing and `handler`. A
    /// close failure is returned only when everything before it succeeded.
    pub fn execute_stored_proc<T, F>(
        self,
        options: ExecuteOptions,
        handler: F,
    ) -> Result<T, SprocError>
    where
        F: FnOnce(&mut SprocResults) -> Result<T, SprocError>,
    {
        tracing::debug!(
            procedure = %self.call.text,
            params = self.call.params.len(),
            behavior = ?options.behavior,
            "executing stored procedure"
        );
        let call = &self.call;
        let mut lease = ConnectionLease::for_reader(&mut *self.connection, options.connection);
        let outcome = run_reader(&mut lease, call, options.behavior, handler);
        lease.finish(outcome)
    }

    /// Execute the procedure expecting no result set.
    ///
    /// A closed connection is always opened; it is closed afterwards only with
    /// [`ConnectionHandling::Managed`]. Returns the affected-row count, or
    /// [`ROWS_AFFECTED_UNKNOWN`](super::ROWS_AFFECTED_UNKNOWN) when the driver
    /// reports none.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if opening or execution fails.
    pub fn execute_stored_non_query(
        self,
        handling: ConnectionHandling,
    ) -> Result<i64, SprocError> {
        tracing::debug!(procedure = %self.call.text, "executing stored procedure as non-query");
        let call = &self.call;
        let mut lease = ConnectionLease::for_non_query(&mut *self.connection, handling);
        let outcome = lease
            .open()
            .and_then(|()| lease.connection().execute_non_query(call));
        rows_affected(lease.finish(outcome)?)
    }
}

fn run_reader<C, T, F>(
    lease: &mut ConnectionLease<'_, C>,
    call: &ProcedureCall,
    behavior: CommandBehavior,
    handler: F,
) -> Result<T, SprocError>
where
    C: SyncConnection + ?Sized,
    F: FnOnce(&mut SprocResults) -> Result<T, SprocError>,
{
    lease.open()?;
    let reader = lease.connection().execute_reader(call)?;
    let mut results = SprocResults::with_behavior(reader, behavior);
    handler(&mut results)
}
