//! Driver-facing traits the execution lifecycle runs against.
//!
//! A backend implements [`DbConnection`] plus [`SyncConnection`] and/or
//! [`AsyncConnection`]. Readers are returned boxed and own their data, so they
//! never borrow the connection that produced them.

use async_trait::async_trait;
use tokio::runtime::{Builder, Runtime};

use crate::command::ProcedureCall;
use crate::error::SprocError;
use crate::results::ResultReader;
use crate::types::ConnectionState;

/// State and teardown shared by synchronous and asynchronous connections.
pub trait DbConnection: Send {
    fn state(&self) -> ConnectionState;

    /// Close the connection. Closing a closed connection is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if the close fails.
    fn close(&mut self) -> Result<(), SprocError>;

    /// Called exactly once when a command built on this connection is dropped.
    fn release_command(&mut self, _call: &ProcedureCall) {}
}

/// Blocking execution surface.
pub trait SyncConnection: DbConnection {
    /// # Errors
    ///
    /// Returns the driver's error if the connection cannot be opened.
    fn open(&mut self) -> Result<(), SprocError>;

    /// Execute `call` and return a reader positioned on its first result set.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if execution fails.
    fn execute_reader(&mut self, call: &ProcedureCall)
    -> Result<Box<dyn ResultReader>, SprocError>;

    /// Execute `call` expecting no result set. `None` means the driver could not
    /// report an affected-row count.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if execution fails.
    fn execute_non_query(&mut self, call: &ProcedureCall) -> Result<Option<u64>, SprocError>;
}

/// Non-blocking execution surface. Cancellation is applied by the caller around
/// these futures, so implementations do not need to observe a token.
#[async_trait]
pub trait AsyncConnection: DbConnection {
    /// # Errors
    ///
    /// Returns the driver's error if the connection cannot be opened.
    async fn open_async(&mut self) -> Result<(), SprocError>;

    /// # Errors
    ///
    /// Returns the driver's error if execution fails.
    async fn execute_reader_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Box<dyn ResultReader>, SprocError>;

    /// # Errors
    ///
    /// Returns the driver's error if execution fails.
    async fn execute_non_query_async(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Option<u64>, SprocError>;
}

/// Blocking adapter over an [`AsyncConnection`], driven by a private
/// current-thread runtime.
///
/// Must not be used from inside another tokio runtime.
pub struct BlockingConnection<C> {
    inner: C,
    runtime: Runtime,
}

impl<C: AsyncConnection> BlockingConnection<C> {
    /// # Errors
    ///
    /// Returns `SprocError::ConfigError` if the runtime cannot be built.
    pub fn new(inner: C) -> Result<Self, SprocError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                SprocError::ConfigError(format!("Failed to build blocking runtime: {e}"))
            })?;
        Ok(Self { inner, runtime })
    }

    #[must_use]
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: AsyncConnection> DbConnection for BlockingConnection<C> {
    fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    fn close(&mut self) -> Result<(), SprocError> {
        self.inner.close()
    }

    fn release_command(&mut self, call: &ProcedureCall) {
        self.inner.release_command(call);
    }
}

impl<C: AsyncConnection> SyncConnection for BlockingConnection<C> {
    fn open(&mut self) -> Result<(), SprocError> {
        self.runtime.block_on(self.inner.open_async())
    }

    fn execute_reader(
        &mut self,
        call: &ProcedureCall,
    ) -> Result<Box<dyn ResultReader>, SprocError> {
        self.runtime.block_on(self.inner.execute_reader_async(call))
    }

    fn execute_non_query(&mut self, call: &ProcedureCall) -> Result<Option<u64>, SprocError> {
        self.runtime.block_on(self.inner.execute_non_query_async(call))
    }
}
