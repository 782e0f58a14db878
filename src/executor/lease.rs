use tokio_util::sync::CancellationToken;

use super::cancellable;
use crate::connection::{AsyncConnection, DbConnection, SyncConnection};
use crate::error::SprocError;
use crate::types::{ConnectionHandling, ConnectionState};

/// Per-call ownership token over a connection.
///
/// Decided once, from the caller's [`ConnectionHandling`] and the state the
/// connection is found in:
///
/// | path      | opens when                     | closes on exit when            |
/// |-----------|--------------------------------|--------------------------------|
/// | reader    | managed and found closed       | managed and found closed       |
/// | non-query | found closed                   | managed                        |
///
/// On the reader paths a connection that is already open belongs to the caller
/// and is left open even when management was requested.
///
/// The close runs from [`finish`](Self::finish) or, if the call unwinds or its
/// future is dropped, from `Drop`.
pub(crate) struct ConnectionLease<'a, C: DbConnection + ?Sized> {
    connection: &'a mut C,
    open_required: bool,
    close_on_exit: bool,
    released: bool,
}

impl<'a, C: DbConnection + ?Sized> ConnectionLease<'a, C> {
    pub(crate) fn for_reader(connection: &'a mut C, handling: ConnectionHandling) -> Self {
        let owned = handling.is_managed() && connection.state() == ConnectionState::Closed;
        Self::new(connection, owned, owned)
    }

    pub(crate) fn for_non_query(connection: &'a mut C, handling: ConnectionHandling) -> Self {
        let found_closed = connection.state() == ConnectionState::Closed;
        Self::new(connection, found_closed, handling.is_managed())
    }

    fn new(connection: &'a mut C, open_required: bool, close_on_exit: bool) -> Self {
        tracing::trace!(open_required, close_on_exit, "connection lease acquired");
        Self {
            connection,
            open_required,
            close_on_exit,
            released: false,
        }
    }

    pub(crate) fn connection(&mut self) -> &mut C {
        self.connection
    }

    /// Release the connection and combine the close result with `outcome`.
    ///
    /// The call's own error always wins over a close error.
    pub(crate) fn finish<T>(mut self, outcome: Result<T, SprocError>) -> Result<T, SprocError> {
        let closed = self.release();
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(error = %close_err, "closing connection failed after an earlier error");
                Err(err)
            }
        }
    }

    fn release(&mut self) -> Result<(), SprocError> {
        if std::mem::replace(&mut self.released, true) || !self.close_on_exit {
            return Ok(());
        }
        tracing::debug!("closing connection");
        self.connection.close()
    }
}

impl<C: SyncConnection + ?Sized> ConnectionLease<'_, C> {
    pub(crate) fn open(&mut self) -> Result<(), SprocError> {
        if self.open_required {
            tracing::debug!("opening connection");
            self.connection.open()?;
        }
        Ok(())
    }
}

impl<C: AsyncConnection + ?Sized> ConnectionLease<'_, C> {
    pub(crate) async fn open_async(
        &mut self,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), SprocError> {
        if self.open_required {
            tracing::debug!("opening connection");
            cancellable(cancel, self.connection.open_async()).await?;
        }
        Ok(())
    }
}

impl<C: DbConnection + ?Sized> Drop for ConnectionLease<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "closing connection failed during cleanup");
        }
    }
}
